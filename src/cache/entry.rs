//! Cache Entry Module
//!
//! Defines the key/value pair stored in the LRU ordering.

use crate::cache::SizedValue;

// == Cache Entry ==
/// A single cached key with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The cache key
    pub key: String,
    /// The stored value
    pub value: V,
}

impl<V: SizedValue> CacheEntry<V> {
    // == Constructor ==
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    // == Size ==
    /// Bytes charged against the store's capacity: key length plus value length.
    pub fn size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}
