use serde::Serialize;
use vodca::References;

use crate::entity::common::{Page, PageSize};

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Position of a result page within the whole result set.
///
/// An empty result set yields the all-zero value, which serializes to `{}`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, References)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: &Page, page_size: &PageSize) -> Self {
        if total_records == 0 {
            return Self::default();
        }
        let page_size = i64::from(*page_size.as_ref());
        Self {
            current_page: i64::from(*page.as_ref()),
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

/// A result page together with its [`Metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, References)]
pub struct Paginated<T> {
    items: Vec<T>,
    metadata: Metadata,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, metadata: Metadata) -> Self {
        Self { items, metadata }
    }

    pub fn into_parts(self) -> (Vec<T>, Metadata) {
        (self.items, self.metadata)
    }
}
