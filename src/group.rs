//! Group Module
//!
//! A group is one cache namespace. It ties together the local cache, request
//! de-duplication, peer selection and the caller's data loader:
//!
//! 1. A local cache hit is returned immediately.
//! 2. Concurrent misses for the same key share one load.
//! 3. The load asks the owning peer first, when that peer is remote.
//! 4. If there is no remote owner, or it fails, the local loader runs.
//! 5. Whatever was loaded is cached locally and handed to every waiter.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStats, GroupStats, GroupStatsSnapshot, LocalCache};
use crate::error::{CacheError, Result};
use crate::models::FetchRequest;
use crate::peers::{PeerGetter, PeerPicker};
use crate::singleflight::FlightGroup;

// == Getter ==
/// Loads the value for a key from the source of truth.
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts an async closure into a `Getter`.
///
/// ```ignore
/// let getter = GetterFn(|key: String| async move { Ok(key.into_bytes()) });
/// ```
pub struct GetterFn<F>(pub F);

#[async_trait]
impl<F, Fut> Getter for GetterFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send,
{
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key.to_string()).await
    }
}

struct GroupInner {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: LocalCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    loader: FlightGroup<ByteView>,
    stats: GroupStats,
}

// == Group ==
/// A named cache namespace. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Group {
    inner: Arc<GroupInner>,
}

impl Group {
    /// Creates a standalone group. Use `GroupRegistry::new_group` to make it
    /// reachable by name from peers.
    pub fn new(name: impl Into<String>, cache_bytes: usize, getter: Arc<dyn Getter>) -> Self {
        Self {
            inner: Arc::new(GroupInner {
                name: name.into(),
                getter,
                main_cache: LocalCache::new(cache_bytes),
                peers: OnceLock::new(),
                loader: FlightGroup::new(),
                stats: GroupStats::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // == Register Peers ==
    /// Sets the peer picker. Allowed once per group.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.inner
            .peers
            .set(peers)
            .map_err(|_| CacheError::PeersAlreadyRegistered(self.inner.name.clone()))
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        self.get_with_deadline(key, None).await
    }

    /// Like `get`, but stops waiting on a shared load after `deadline`. The
    /// load itself keeps going for other callers.
    pub async fn get_with_deadline(&self, key: &str, deadline: Option<Duration>) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key is required".to_string()));
        }

        self.inner.stats.record_get();
        if let Some(value) = self.inner.main_cache.get(key) {
            self.inner.stats.record_cache_hit();
            debug!("[{}] cache hit for {}", self.inner.name, key);
            return Ok(value);
        }

        let inner = self.inner.clone();
        let owned_key = key.to_string();
        self.inner
            .loader
            .work_with_deadline(key, deadline, move || async move { inner.load(&owned_key).await })
            .await
    }

    // == Stats ==
    pub fn stats(&self) -> GroupStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.main_cache.stats()
    }

    /// Counts a request received from a peer.
    pub fn record_server_request(&self) {
        self.inner.stats.record_server_request();
    }
}

impl GroupInner {
    async fn load(&self, key: &str) -> Result<ByteView> {
        // Another flight may have filled the cache between our miss and now.
        if let Some(value) = self.main_cache.peek(key) {
            self.stats.record_cache_hit();
            return Ok(value);
        }
        self.stats.record_load();

        if let Some(peer) = self.peers.get().and_then(|picker| picker.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key).await {
                Ok(value) => {
                    self.stats.record_peer_load();
                    self.main_cache.add(key, value.clone());
                    return Ok(value);
                }
                Err(err) => {
                    self.stats.record_peer_error();
                    warn!("[{}] failed to get {} from peer: {}", self.name, key, err);
                }
            }
        }

        self.get_locally(key).await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let req = FetchRequest::new(self.name.as_str(), key);
        let resp = peer.get(&req).await?;
        Ok(ByteView::from(resp.value))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        debug!("[{}] loading {} locally", self.name, key);
        match self.getter.get(key).await {
            Ok(bytes) => {
                self.stats.record_local_load();
                let value = ByteView::from(bytes);
                self.main_cache.add(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                self.stats.record_local_load_error();
                Err(CacheError::Load(err.to_string()))
            }
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.inner.name)
            .field("cache_bytes", &self.inner.main_cache.capacity())
            .field("has_peers", &self.inner.peers.get().is_some())
            .finish()
    }
}
