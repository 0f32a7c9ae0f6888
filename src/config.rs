//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::consistent_hash::DEFAULT_REPLICAS;
use crate::peers::{HttpPoolOptions, DEFAULT_BASE_PATH, DEFAULT_PEER_TIMEOUT};

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// This node's address as the other peers know it
    pub node_addr: String,
    /// Every node in the cluster, including this one
    pub peers: Vec<String>,
    /// Path prefix of the peer protocol
    pub base_path: String,
    /// Capacity of each group's local cache in bytes (0 = unbounded)
    pub cache_bytes: usize,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
    /// Timeout for one remote fetch in milliseconds (0 = none)
    pub peer_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8001)
    /// - `NODE_ADDR` - Own peer address (default: http://127.0.0.1:<port>)
    /// - `PEERS` - Comma-separated peer addresses (default: just `NODE_ADDR`)
    /// - `BASE_PATH` - Peer protocol prefix (default: /_rqcache/)
    /// - `CACHE_BYTES` - Local cache capacity (default: 2048)
    /// - `REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `PEER_TIMEOUT_MS` - Remote fetch timeout (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_port = parse_var("SERVER_PORT").unwrap_or(defaults.server_port);
        let node_addr =
            env::var("NODE_ADDR").unwrap_or_else(|_| format!("http://127.0.0.1:{}", server_port));
        let peers = env::var("PEERS")
            .ok()
            .map(|v| parse_peers(&v))
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![node_addr.clone()]);

        Self {
            server_port,
            node_addr,
            peers,
            base_path: env::var("BASE_PATH").unwrap_or(defaults.base_path),
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(defaults.cache_bytes),
            replicas: parse_var("REPLICAS").unwrap_or(defaults.replicas),
            peer_timeout_ms: parse_var("PEER_TIMEOUT_MS").unwrap_or(defaults.peer_timeout_ms),
        }
    }

    /// Options for the node's `HttpPool`.
    pub fn pool_options(&self) -> HttpPoolOptions {
        HttpPoolOptions {
            base_path: self.base_path.clone(),
            replicas: self.replicas,
            hash_fn: None,
            timeout: (self.peer_timeout_ms > 0).then(|| Duration::from_millis(self.peer_timeout_ms)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8001,
            node_addr: "http://127.0.0.1:8001".to_string(),
            peers: vec!["http://127.0.0.1:8001".to_string()],
            base_path: DEFAULT_BASE_PATH.to_string(),
            cache_bytes: 2 << 10,
            replicas: DEFAULT_REPLICAS,
            peer_timeout_ms: DEFAULT_PEER_TIMEOUT.as_millis() as u64,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_peers(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
