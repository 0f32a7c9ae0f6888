//! Request payloads for the peer protocol
//!
//! A peer asks for one key of one group.

use serde::{Deserialize, Serialize};

/// A fetch of `key` from `group` on a remote peer.
///
/// On the wire both fields travel as URL path segments:
/// `<basePath><group>/<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Name of the cache group
    pub group: String,
    /// Key inside the group
    pub key: String,
}

impl FetchRequest {
    pub fn new(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
        }
    }

    /// Path of this request relative to a peer's base URL, with both
    /// segments percent-encoded.
    pub fn path(&self) -> String {
        format!(
            "{}/{}",
            urlencoding::encode(&self.group),
            urlencoding::encode(&self.key)
        )
    }
}
