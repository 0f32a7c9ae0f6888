//! Payload models
//!
//! The peer protocol's request/response pair and the JSON bodies of the
//! operational endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::FetchRequest;
pub use responses::{
    FetchResponse, GroupStatsResponse, HealthResponse, StatsResponse, FETCH_CONTENT_TYPE,
};
