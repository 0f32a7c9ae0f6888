//! Cache Module
//!
//! Provides the byte-bounded LRU store and the locked local cache built on it.

mod byteview;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::{ByteView, SizedValue};
pub use entry::CacheEntry;
pub use lru::{EvictionCallback, LruCache};
pub use stats::{CacheStats, GroupStats, GroupStatsSnapshot};
pub use store::LocalCache;
