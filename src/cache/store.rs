//! Local Cache Module
//!
//! Thread-safe wrapper around the LRU store, built lazily on first insert.

use parking_lot::Mutex;

use crate::cache::{ByteView, CacheStats, LruCache};

#[derive(Debug, Default)]
struct Inner {
    lru: Option<LruCache<ByteView>>,
    stats: CacheStats,
}

// == Local Cache ==
/// The only owner of a group's `LruCache`. Every access goes through one mutex.
#[derive(Debug)]
pub struct LocalCache {
    /// Capacity handed to the LRU store when it is created
    cache_bytes: usize,
    inner: Mutex<Inner>,
}

impl LocalCache {
    // == Constructor ==
    /// Creates an empty cache; no storage is allocated until the first `add`.
    pub fn new(cache_bytes: usize) -> Self {
        Self {
            cache_bytes,
            inner: Mutex::new(Inner::default()),
        }
    }

    // == Add ==
    pub fn add(&self, key: &str, value: ByteView) {
        let mut inner = self.inner.lock();
        let cache_bytes = self.cache_bytes;
        inner
            .lru
            .get_or_insert_with(|| LruCache::new(cache_bytes))
            .add(key, value);
    }

    // == Get ==
    /// Looks up `key`, counting the hit or miss.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock();
        let found = inner.lru.as_mut().and_then(|lru| lru.get(key));
        match found {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        found
    }

    /// Looks up `key` without touching the hit/miss counters.
    pub fn peek(&self, key: &str) -> Option<ByteView> {
        self.inner.lock().lru.as_mut().and_then(|lru| lru.get(key))
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        if let Some(lru) = inner.lru.as_ref() {
            stats.evictions = lru.evictions();
            stats.total_entries = lru.len();
            stats.bytes = lru.used_bytes();
        }
        stats
    }

    pub fn capacity(&self) -> usize {
        self.cache_bytes
    }

    /// Returns true once the LRU store has been created.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock().lru.is_some()
    }
}
