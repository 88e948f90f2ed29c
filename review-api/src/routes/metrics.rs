//! `GET /metrics/reviews` — read-only snapshot of the Metrics Sink
//! (spec.md §4.L), the Redis `metrics:reviews:*` counters/sorted-set
//! surfaced over HTTP instead of read directly by an operator.

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::core::AppState;

pub async fn get_review_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}
