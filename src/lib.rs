//! rqcache - A read-through, peer-replicated in-memory cache
//!
//! Each node answers `get(key)` from its own LRU cache, from the peer that
//! owns the key on a consistent hash ring, or from a caller-supplied loader,
//! collapsing concurrent misses for the same key into a single load.

pub mod api;
pub mod cache;
pub mod config;
pub mod consistent_hash;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;
pub mod registry;
pub mod singleflight;

pub use api::{create_router, AppState};
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Getter, GetterFn, Group};
pub use peers::{HttpPool, HttpPoolOptions, PeerGetter, PeerPicker};
pub use registry::GroupRegistry;
