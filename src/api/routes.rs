//! API Routes
//!
//! Configures the Axum router for the peer protocol and the operational
//! endpoints.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{
    bad_peer_path_handler, health_handler, peer_get_handler, stats_handler, AppState,
};

/// Creates the router with all endpoints configured.
///
/// # Endpoints
/// - `GET <base_path><group>/<key>` - Serve a value to a peer
/// - `GET /stats` - Per-group statistics
/// - `GET /health` - Health check endpoint
///
/// `base_path` must start and end with `/`, as `HttpPool::base_path` does.
pub fn create_router(state: AppState, base_path: &str) -> Router {
    Router::new()
        .route(&format!("{base_path}*rest"), get(peer_get_handler))
        .route(base_path, get(bad_peer_path_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
