use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct SelectLimit(i64);

impl SelectLimit {
    pub fn new(value: impl Into<i64>) -> Self {
        SelectLimit(value.into())
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize,
)]
pub struct SelectOffset(i64);

impl SelectOffset {
    pub fn new(value: impl Into<i64>) -> Self {
        SelectOffset(value.into())
    }
}

/// One-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct Page(i32);

impl Page {
    pub const FIRST: i32 = 1;
    pub const MAX: i32 = 10_000_000;

    pub fn new(value: impl Into<i32>) -> Self {
        Page(value.into())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::FIRST)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct PageSize(i32);

impl PageSize {
    pub const MAX: i32 = 100;

    pub fn new(value: impl Into<i32>) -> Self {
        PageSize(value.into())
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::new(20)
    }
}
