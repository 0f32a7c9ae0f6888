//! Integration Tests for the Peer Protocol Endpoint
//!
//! Tests the full request/response cycle through the public router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use rqcache::models::FetchResponse;
use rqcache::{create_router, AppState, GetterFn, GroupRegistry};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(loads: Arc<AtomicUsize>) -> Router {
    let registry = GroupRegistry::new();
    let getter = GetterFn(move |key: String| {
        let loads = loads.clone();
        async move {
            loads.fetch_add(1, Ordering::SeqCst);
            match key.as_str() {
                "Tom" => Ok(b"550".to_vec()),
                "path/with/slashes" => Ok(b"nested".to_vec()),
                "with space" => Ok(b"spaced".to_vec()),
                _ => Err(anyhow::anyhow!("{key} not exist")),
            }
        }
    });
    registry
        .new_group("scores", 2048, Arc::new(getter))
        .unwrap();
    create_router(AppState::new(registry), "/_rqcache/")
}

async fn send(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// == Peer Endpoint ==

#[tokio::test]
async fn test_value_is_loaded_once_and_then_cached() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = create_test_app(loads.clone());

    for _ in 0..3 {
        let response = send(&app, "/_rqcache/scores/Tom").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        let decoded = FetchResponse::decode(&body_bytes(response).await).unwrap();
        assert_eq!(decoded.value, b"550");
    }

    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_key_may_contain_slashes() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    let response = send(&app, "/_rqcache/scores/path/with/slashes").await;
    assert_eq!(response.status(), StatusCode::OK);
    let decoded = FetchResponse::decode(&body_bytes(response).await).unwrap();
    assert_eq!(decoded.value, b"nested");
}

#[tokio::test]
async fn test_escaped_key_is_decoded() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    let response = send(&app, "/_rqcache/scores/with%20space").await;
    assert_eq!(response.status(), StatusCode::OK);
    let decoded = FetchResponse::decode(&body_bytes(response).await).unwrap();
    assert_eq!(decoded.value, b"spaced");
}

#[tokio::test]
async fn test_malformed_path_is_bad_request() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    for uri in ["/_rqcache/scores", "/_rqcache/"] {
        let response = send(&app, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
    }
}

#[tokio::test]
async fn test_empty_key_is_bad_request() {
    let loads = Arc::new(AtomicUsize::new(0));
    let app = create_test_app(loads.clone());

    let response = send(&app, "/_rqcache/scores/").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    let response = send(&app, "/_rqcache/players/Tom").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("players"));
}

#[tokio::test]
async fn test_loader_failure_is_internal_error() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    let response = send(&app, "/_rqcache/scores/Unknown").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("Unknown not exist"));
}

#[tokio::test]
async fn test_path_outside_base_is_not_routed() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    let response = send(&app, "/other/scores/Tom").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Operational Endpoints ==

#[tokio::test]
async fn test_stats_reflect_traffic() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    send(&app, "/_rqcache/scores/Tom").await;
    send(&app, "/_rqcache/scores/Tom").await;

    let response = send(&app, "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

    let scores = &json["groups"][0];
    assert_eq!(scores["name"], "scores");
    assert_eq!(scores["group"]["gets"], 2);
    assert_eq!(scores["group"]["cache_hits"], 1);
    assert_eq!(scores["group"]["local_loads"], 1);
    assert_eq!(scores["group"]["server_requests"], 2);
    assert_eq!(scores["cache"]["total_entries"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(AtomicUsize::new(0)));

    let response = send(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}
