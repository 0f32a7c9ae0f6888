//! HTTP peer pool
//!
//! Holds the current peer set as a hash ring plus one `HttpGetter` per peer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::consistent_hash::{HashFn, HashRing, DEFAULT_REPLICAS};
use crate::peers::{HttpGetter, PeerGetter, PeerPicker};

/// Path prefix under which peers serve each other.
pub const DEFAULT_BASE_PATH: &str = "/_rqcache/";

/// Remote fetch timeout used unless the options say otherwise.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(3);

/// Tuning knobs for an `HttpPool`.
#[derive(Clone)]
pub struct HttpPoolOptions {
    /// Path prefix of the peer protocol, e.g. `/_rqcache/`
    pub base_path: String,
    /// Virtual nodes per peer
    pub replicas: usize,
    /// Ring hash; `None` uses the default
    pub hash_fn: Option<HashFn>,
    /// Per-request timeout for remote fetches; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for HttpPoolOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            hash_fn: None,
            timeout: Some(DEFAULT_PEER_TIMEOUT),
        }
    }
}

impl fmt::Debug for HttpPoolOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPoolOptions")
            .field("base_path", &self.base_path)
            .field("replicas", &self.replicas)
            .field("custom_hash", &self.hash_fn.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug)]
struct PeerSet {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Peer picker backed by a consistent hash ring of HTTP peers.
///
/// Its lock guards only the ring and the getter map and is independent of
/// any group's cache lock.
pub struct HttpPool {
    /// This node's own address, e.g. `http://10.0.0.1:8001`
    self_addr: String,
    options: HttpPoolOptions,
    http_client: reqwest::Client,
    peers: Mutex<PeerSet>,
}

impl HttpPool {
    /// Creates a pool with default options, including a
    /// `DEFAULT_PEER_TIMEOUT` bound on every remote fetch.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::with_options(self_addr, HttpPoolOptions::default())
    }

    pub fn with_options(self_addr: impl Into<String>, mut options: HttpPoolOptions) -> Self {
        options.base_path = normalize_base_path(&options.base_path);
        let ring = HashRing::new(options.replicas, options.hash_fn.clone());

        Self {
            self_addr: self_addr.into(),
            options,
            http_client: reqwest::Client::new(),
            peers: Mutex::new(PeerSet {
                ring,
                getters: HashMap::new(),
            }),
        }
    }

    // == Set Peers ==
    /// Replaces the whole peer set. The new ring and getters are built first
    /// and swapped in together, so `pick_peer` never sees a mix.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();

        let mut ring = HashRing::new(self.options.replicas, self.options.hash_fn.clone());
        ring.add(&peers);

        let getters = peers
            .iter()
            .map(|peer| {
                let getter = HttpGetter::new(
                    format!("{}{}", peer, self.options.base_path),
                    self.http_client.clone(),
                )
                .with_timeout(self.options.timeout);
                (peer.clone(), Arc::new(getter))
            })
            .collect();

        *self.peers.lock() = PeerSet { ring, getters };
        info!("[server {}] peer set updated: {:?}", self.self_addr, peers);
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.options.base_path
    }

    /// Addresses in the current peer set.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.lock().getters.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// The peer address that owns `key`, which may be this node.
    pub fn owner_of(&self, key: &str) -> Option<String> {
        self.peers.lock().ring.get(key).map(str::to_string)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let peers = self.peers.lock();
        let owner = peers.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }

        debug!("[server {}] pick peer {}", self.self_addr, owner);
        let getter = peers.getters.get(owner)?.clone();
        Some(getter as Arc<dyn PeerGetter>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("options", &self.options)
            .finish()
    }
}

/// Ensures a leading and a trailing `/`.
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELF: &str = "http://127.0.0.1:8001";

    fn pool() -> HttpPool {
        let pool = HttpPool::new(SELF);
        pool.set_peers([SELF, "http://127.0.0.1:8002", "http://127.0.0.1:8003"]);
        pool
    }

    #[test]
    fn test_empty_pool_picks_nothing() {
        let pool = HttpPool::new(SELF);
        assert!(pool.pick_peer("Tom").is_none());
        assert!(pool.owner_of("Tom").is_none());
    }

    #[test]
    fn test_pick_peer_skips_self() {
        let pool = pool();

        let mut local = 0;
        let mut remote = 0;
        for i in 0..300 {
            let key = format!("key-{i}");
            let owner = pool.owner_of(&key).unwrap();
            match pool.pick_peer(&key) {
                Some(_) => {
                    assert_ne!(owner, SELF);
                    remote += 1;
                }
                None => {
                    assert_eq!(owner, SELF);
                    local += 1;
                }
            }
        }
        assert!(local > 0);
        assert!(remote > 0);
    }

    #[test]
    fn test_only_self_is_always_local() {
        let pool = HttpPool::new(SELF);
        pool.set_peers([SELF]);

        for i in 0..100 {
            assert!(pool.pick_peer(&format!("key-{i}")).is_none());
        }
    }

    #[test]
    fn test_set_peers_replaces_previous_set() {
        let pool = pool();
        pool.set_peers(["http://127.0.0.1:9001"]);

        assert_eq!(pool.peers(), vec!["http://127.0.0.1:9001"]);
        for i in 0..50 {
            let key = format!("key-{i}");
            assert_eq!(pool.owner_of(&key).as_deref(), Some("http://127.0.0.1:9001"));
            assert!(pool.pick_peer(&key).is_some());
        }
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/_rqcache/"), "/_rqcache/");
        assert_eq!(normalize_base_path("_rqcache"), "/_rqcache/");
        assert_eq!(normalize_base_path("/a/b"), "/a/b/");
        assert_eq!(normalize_base_path(""), "/");
    }

    #[test]
    fn test_default_options_bound_remote_fetches() {
        let options = HttpPoolOptions::default();
        assert_eq!(options.timeout, Some(DEFAULT_PEER_TIMEOUT));
        assert_eq!(options.base_path, DEFAULT_BASE_PATH);
        assert_eq!(options.replicas, DEFAULT_REPLICAS);
    }

    #[test]
    fn test_custom_options() {
        let options = HttpPoolOptions {
            base_path: "/peer".to_string(),
            replicas: 3,
            ..Default::default()
        };
        let pool = HttpPool::with_options(SELF, options);
        assert_eq!(pool.base_path(), "/peer/");
    }
}
