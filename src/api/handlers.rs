//! API Handlers
//!
//! The peer protocol endpoint plus health and stats.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::{
    FetchResponse, GroupStatsResponse, HealthResponse, StatsResponse, FETCH_CONTENT_TYPE,
};
use crate::registry::GroupRegistry;

/// Application state shared across all handlers.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Groups reachable by name from peers
    pub registry: GroupRegistry,
}

impl AppState {
    pub fn new(registry: GroupRegistry) -> Self {
        Self { registry }
    }
}

/// Splits `<group>/<key>` at the first `/`. The key may itself contain `/`.
pub fn parse_peer_path(rest: &str) -> Result<(&str, &str)> {
    rest.split_once('/')
        .ok_or_else(|| CacheError::InvalidRequest(format!("bad request path: {rest}")))
}

/// Handler for GET <basePath><group>/<key>
///
/// Answers a peer's fetch with the bincode-encoded value.
pub async fn peer_get_handler(
    State(state): State<AppState>,
    Path(rest): Path<String>,
) -> Result<Response> {
    debug!("peer request for {}", rest);
    let (group_name, key) = parse_peer_path(&rest)?;

    let group = state
        .registry
        .get_group(group_name)
        .ok_or_else(|| CacheError::GroupNotFound(group_name.to_string()))?;
    group.record_server_request();

    let view = group.get(key).await?;
    let body = FetchResponse::encode_value(view.as_bytes())?;

    Ok(([(header::CONTENT_TYPE, FETCH_CONTENT_TYPE)], body).into_response())
}

/// Handler for GET <basePath> with nothing after it
pub async fn bad_peer_path_handler() -> CacheError {
    CacheError::InvalidRequest("bad request path".to_string())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let groups = state
        .registry
        .groups()
        .into_iter()
        .map(|group| GroupStatsResponse::new(group.name(), group.stats(), group.cache_stats()))
        .collect();

    Json(StatsResponse { groups })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
