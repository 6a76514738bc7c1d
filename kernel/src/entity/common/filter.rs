use std::fmt::{Display, Formatter};

use vodca::References;

use crate::entity::common::{Page, PageSize, SelectLimit, SelectOffset};

const DESCENDING_PREFIX: char = '-';

/// Closed set of sort keys a caller may ask for. A key names a column, optionally
/// prefixed with `-` for descending order.
///
/// Only text held by this table ever reaches query construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSafelist(&'static [&'static str]);

impl SortSafelist {
    pub const fn new(keys: &'static [&'static str]) -> Self {
        Self(keys)
    }

    pub fn permits(&self, sort: &str) -> bool {
        self.lookup(sort).is_some()
    }

    fn lookup(&self, sort: &str) -> Option<&'static str> {
        self.0.iter().copied().find(|key| *key == sort)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Page, page size and sort order of a list query.
///
/// Callers must have run the sort key through the safelist check
/// (`validate_filter`) before handing the filter to a query.
#[derive(Debug, Clone, PartialEq, Eq, References)]
pub struct Filter {
    page: Page,
    page_size: PageSize,
    sort: String,
    sort_safelist: SortSafelist,
}

impl Filter {
    pub const DEFAULT_SORT: &'static str = "id";

    pub fn new(
        page: Page,
        page_size: PageSize,
        sort: impl Into<String>,
        sort_safelist: SortSafelist,
    ) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist,
        }
    }

    /// Column named by the sort key, taken from the safelist rather than the caller's text.
    ///
    /// # Panics
    ///
    /// When the sort key is not in the safelist. The safelist check happens upstream,
    /// so reaching this is a defect in the calling code.
    pub fn sort_column(&self) -> &'static str {
        match self.sort_safelist.lookup(&self.sort) {
            Some(key) => key.trim_start_matches(DESCENDING_PREFIX),
            None => panic!("unsafe sort parameter: {}", self.sort),
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with(DESCENDING_PREFIX) {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn limit(&self) -> SelectLimit {
        SelectLimit::new(*self.page_size.as_ref())
    }

    pub fn offset(&self) -> SelectOffset {
        let page = i64::from(*self.page.as_ref());
        let page_size = i64::from(*self.page_size.as_ref());
        SelectOffset::new((page - 1) * page_size)
    }
}
