//! `GET /admin/queue` — Priority Queue inspector (SPEC_FULL.md §2
//! Supplemental Features): pending/active/scheduled/retry/archived
//! counts, for an operator diagnosing a stuck pipeline without reaching
//! for a separate broker-side tool.

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::core::AppState;

pub async fn get_queue_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.queue.inspect().await)
}
