//! Peers Module
//!
//! How a group finds the peer that owns a key and fetches from it.
//!
//! - `PeerPicker` chooses the owner of a key, or none when the key is ours.
//! - `PeerGetter` fetches a value from one remote peer.
//! - `HttpPool` implements both sides over HTTP with a consistent hash ring.

pub mod client;
pub mod pool;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FetchRequest, FetchResponse};

pub use client::HttpGetter;
pub use pool::{HttpPool, HttpPoolOptions, DEFAULT_BASE_PATH, DEFAULT_PEER_TIMEOUT};

/// Fetches values from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the remote owner of `key`, or `None` when no peer is known or
    /// the owner is this node.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}
