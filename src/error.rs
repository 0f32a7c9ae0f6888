//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache node.
///
/// Errors are `Clone` because a single failed load is handed to every caller
/// that was waiting on the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key or malformed request path
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No group registered under this name
    #[error("No such group: {0}")]
    GroupNotFound(String),

    /// A group with this name already exists
    #[error("Duplicate registration of group: {0}")]
    DuplicateGroup(String),

    /// A peer picker was already registered for this group
    #[error("Peers already registered for group: {0}")]
    PeersAlreadyRegistered(String),

    /// Peer unreachable or answered with a non-success status
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    /// The local data loader failed
    #[error("Load failed: {0}")]
    Load(String),

    /// Encoding or decoding of a wire payload failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Gave up waiting on an in-flight load
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::GroupNotFound("g".into()), StatusCode::NOT_FOUND),
            (CacheError::Load("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (CacheError::Serialization("eof".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (CacheError::Timeout("k".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_bincode_error_becomes_serialization() {
        let err: CacheError = bincode::deserialize::<String>(&[0xff])
            .unwrap_err()
            .into();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
