//! `POST /reviews/{id}/retry` (spec.md §6): re-enqueues a failed review
//! at priority 1, the highest the queue recognises — a manual retry is
//! an operator/user explicitly asking to jump the line.

use std::sync::Arc;

use axum::{Json, extract::{Path, State}, response::IntoResponse};
use review_types::ReviewId;
use serde::Serialize;
use uuid::Uuid;

use crate::core::AppState;
use crate::error_handler::{AppError, AppResult};

const MANUAL_RETRY_PRIORITY: i32 = 1;

#[derive(Serialize)]
struct RetryAck {
    status: &'static str,
    review_id: Uuid,
}

pub async fn retry_review(State(state): State<Arc<AppState>>, Path(review_id): Path<Uuid>) -> AppResult<impl IntoResponse> {
    let review_id = ReviewId(review_id);
    state.store.reviews.get(review_id).await?.ok_or(AppError::NotFound)?;

    state.store.reviews.retry(review_id).await?;
    state.queue.enqueue(review_id, MANUAL_RETRY_PRIORITY).await;

    Ok(Json(RetryAck { status: "retried", review_id: review_id.0 }))
}
