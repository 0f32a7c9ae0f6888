//! Consistent Hashing
//!
//! Maps keys onto a ring of virtual nodes so that each key is owned by
//! exactly one peer and a membership change only remaps the keys whose
//! neighbourhood on the ring changed.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use twox_hash::XxHash32;

/// Hash function used to place virtual nodes and keys on the ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Virtual nodes per peer when none is configured.
pub const DEFAULT_REPLICAS: usize = 50;

/// XXH32 with seed 0.
pub fn default_hash(data: &[u8]) -> u32 {
    let mut hasher = XxHash32::with_seed(0);
    hasher.write(data);
    hasher.finish() as u32
}

// == Hash Ring ==
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    /// Virtual nodes sorted by hash, each pointing back at its peer
    nodes: Vec<(u32, String)>,
}

impl HashRing {
    /// Creates an empty ring. `hash` defaults to `default_hash`.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            replicas,
            hash: hash.unwrap_or_else(|| Arc::new(default_hash) as HashFn),
            nodes: Vec::new(),
        }
    }

    // == Add ==
    /// Places `replicas` virtual nodes for every peer, named `"{i}{peer}"`.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hash)(format!("{i}{peer}").as_bytes());
                self.nodes.push((hash, peer.to_string()));
            }
        }
        self.nodes.sort_unstable();
    }

    // == Get ==
    /// Returns the peer owning `key`: the first virtual node at or after the
    /// key's hash, wrapping around to the start of the ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.nodes.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.nodes.partition_point(|(h, _)| *h < hash);
        let (_, peer) = &self.nodes[idx % self.nodes.len()];
        Some(peer.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS, None)
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.nodes.len())
            .finish()
    }
}
