//! Response payloads
//!
//! The binary peer response plus the JSON bodies of the health and stats
//! endpoints.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, GroupStatsSnapshot};
use crate::error::Result;

/// Content type of an encoded `FetchResponse`.
pub const FETCH_CONTENT_TYPE: &str = "application/octet-stream";

/// Body of a successful peer fetch, bincode-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// The cached value's bytes
    pub value: Vec<u8>,
}

impl FetchResponse {
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Encodes `value` with the same layout as `FetchResponse::encode`,
    /// without copying it into an owned response first.
    pub fn encode_value(value: &[u8]) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&FetchResponseRef { value })?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[derive(Serialize)]
struct FetchResponseRef<'a> {
    value: &'a [u8],
}

/// Per-group entry of the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatsResponse {
    /// Group name
    pub name: String,
    /// Load counters
    pub group: GroupStatsSnapshot,
    /// Local cache metrics
    pub cache: CacheStats,
    /// Local cache hit rate
    pub hit_rate: f64,
}

impl GroupStatsResponse {
    pub fn new(name: impl Into<String>, group: GroupStatsSnapshot, cache: CacheStats) -> Self {
        Self {
            name: name.into(),
            hit_rate: cache.hit_rate(),
            group,
            cache,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub groups: Vec<GroupStatsResponse>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
