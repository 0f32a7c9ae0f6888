//! API Module
//!
//! HTTP surface of a cache node.
//!
//! # Endpoints
//! - `GET <base_path><group>/<key>` - Peer protocol: serve one value
//! - `GET /stats` - Per-group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
