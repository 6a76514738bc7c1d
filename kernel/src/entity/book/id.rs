use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BookId(i64);

impl BookId {
    /// The `bigserial` sequence backing `books.id` starts here.
    pub const MIN: i64 = 1;

    pub fn new(id: impl Into<i64>) -> Self {
        Self(id.into())
    }

    /// Ids below [`BookId::MIN`] can never belong to a row.
    pub fn is_valid(&self) -> bool {
        self.0 >= Self::MIN
    }
}
