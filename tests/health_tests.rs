//! Probe endpoint tests
//!
//! Drives the stateless health handlers through a router, the same way an
//! orchestrator's probes would hit them.

use axum::{body::Body, http::Request, routing::get, Router};
use tower::ServiceExt;

use campus_stream::presentation::http::handlers::health::{health_check, liveness};

fn probe_router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

async fn get_json(router: Router, uri: &str) -> (u16, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn health_reports_healthy_with_version() {
    let (status, json) = get_json(probe_router(), "/health").await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn liveness_reports_alive() {
    let (status, json) = get_json(probe_router(), "/health/live").await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "alive");
}
