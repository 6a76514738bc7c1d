use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::marker::PhantomData;

use vodca::{AsRefln, Fromln};

/// Optimistic concurrency token of a row.
///
/// Starts at [`Version::INITIAL`] and only ever moves through [`Version::next`].
/// It carries no business meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct Version<T>(i32, PhantomData<T>);

impl<T> Version<T> {
    pub const INITIAL: i32 = 1;

    pub fn new(version: impl Into<i32>) -> Self {
        Self(version.into(), PhantomData)
    }

    pub fn initial() -> Self {
        Self::new(Self::INITIAL)
    }

    pub fn next(&self) -> Self {
        Self::new(self.0 + 1)
    }
}

impl<T> Serialize for Version<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Version<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::new)
    }
}
