//! HTTP surface: webhook ingress (spec.md §4.A/§6) plus the management
//! API endpoints the core owns directly (`/feedback/*`,
//! `/reviews/{id}/retry`) and the ambient operational endpoints
//! (`/healthz`, `/readyz`, `/metrics/reviews`, `/admin/queue`).
//!
//! Generalizes the teacher's `api::start()` (a single bare `println!`
//! stub in `mr-ai-backend/api/src/lib.rs`) into a real axum app builder:
//! `build_router` is pure and testable; `serve` owns the listener.

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};

pub use core::AppState;
use error_handler::AppError;
use middleware_layer::json_extractor::json_error_mapper;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/{platform}", post(webhooks::route::handle_webhook))
        .route("/feedback", post(routes::feedback::record_feedback))
        .route("/feedback/patterns", get(routes::feedback::feedback_patterns))
        .route("/feedback/preferences", get(routes::feedback::feedback_preferences))
        .route("/reviews/{id}/retry", post(routes::retry::retry_review))
        .route("/healthz", get(routes::health::healthz))
        .route("/readyz", get(routes::health::readyz))
        .route("/metrics/reviews", get(routes::metrics::get_review_metrics))
        .route("/admin/queue", get(routes::queue_admin::get_queue_stats))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Binds and serves the router on `AppState.config.port`. Runs until the
/// listener fails or the process is killed; the worker pool's own
/// graceful drain (review-worker) is a separate task the caller spawns
/// alongside this one.
pub async fn serve(state: Arc<AppState>) -> Result<(), AppError> {
    let port = state.config.port;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await.map_err(AppError::Bind)?;
    tracing::info!(port, "review-api listening");
    axum::serve(listener, app).await.map_err(AppError::Server)
}
