use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Ordered genre names. Order is kept for round trips; filtering treats them as a set.
#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BookGenres(Vec<String>);

impl BookGenres {
    pub const MIN_LEN: usize = 1;
    pub const MAX_LEN: usize = 5;

    pub fn new(genres: impl Into<Vec<String>>) -> Self {
        Self(genres.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.0.iter().any(|g| g == genre)
    }

    /// Whether every genre of `other` is also in `self`.
    pub fn is_superset_of(&self, other: &BookGenres) -> bool {
        other.0.iter().all(|genre| self.contains(genre))
    }
}

#[cfg(test)]
mod test {
    use super::BookGenres;

    fn genres(values: &[&str]) -> BookGenres {
        BookGenres::new(values.iter().map(|v| v.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn superset_ignores_order() {
        let book = genres(&["drama", "fiction", "history"]);
        assert!(book.is_superset_of(&genres(&["history", "drama"])));
        assert!(!book.is_superset_of(&genres(&["drama", "poetry"])));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(genres(&["drama"]).is_superset_of(&BookGenres::default()));
        assert!(BookGenres::default().is_superset_of(&BookGenres::default()));
    }
}
