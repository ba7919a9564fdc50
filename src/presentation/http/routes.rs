//! Route Configuration
//!
//! Configures all HTTP routes for the service.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, security_headers};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Security headers on every response, error responses included
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes (all require a resolved tenant context)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/chat", chat_routes())
        .nest("/presence", presence_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Chat routes: the stream, the unread counter, and the write path
fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/stream", get(handlers::stream::open_stream))
        .route("/unread", get(handlers::unread::unread_count))
        .route("/messages", post(handlers::message::send_message))
        .route(
            "/messages/{message_id}/confirm",
            post(handlers::message::confirm_message),
        )
}

/// Presence routes: listing and heartbeat
fn presence_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::presence::list_online))
        .route("/heartbeat", post(handlers::presence::heartbeat))
}
