//! `POST /feedback`, `GET /feedback/patterns`, `GET /feedback/preferences`
//! (spec.md §6 Management API). `X-Org-ID` identifies the tenant; this
//! crate trusts it as already authenticated upstream (spec.md's own
//! Non-goals exclude session/auth — see SPEC_FULL.md §6).

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use review_types::{FeedbackDecision, FeedbackRecord, OrgId, ReviewId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::AppState;
use crate::error_handler::{AppError, AppResult};

/// Default per-location dismissal count before a finding is suppressed,
/// mirrored from `review-postprocess`'s own default (spec.md §4.J step 3).
const DEFAULT_SUPPRESSION_THRESHOLD: usize = 3;
const DEFAULT_LEARNING_WINDOW_DAYS: i64 = 30;

fn org_id_from_headers(headers: &HeaderMap) -> AppResult<OrgId> {
    let raw = headers
        .get("x-org-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing X-Org-ID header".to_string()))?;
    let uuid: Uuid = raw.parse().map_err(|_| AppError::BadRequest("X-Org-ID is not a valid UUID".to_string()))?;
    Ok(OrgId(uuid))
}

#[derive(Deserialize)]
pub struct RecordFeedbackRequest {
    pub review_id: Uuid,
    pub comment_id: String,
    pub file_path: String,
    pub line_number: u32,
    pub feedback: FeedbackDecision,
}

#[derive(Serialize)]
pub struct RecordFeedbackResponse {
    pub status: &'static str,
}

pub async fn record_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RecordFeedbackRequest>,
) -> AppResult<Json<RecordFeedbackResponse>> {
    let org_id = org_id_from_headers(&headers)?;

    let record = FeedbackRecord {
        review_id: ReviewId(body.review_id),
        comment_id: body.comment_id,
        org_id,
        file_path: body.file_path,
        line_number: body.line_number,
        decision: body.feedback,
        created_at: Utc::now(),
    };
    state.store.feedback.record(record).await?;

    Ok(Json(RecordFeedbackResponse { status: "recorded" }))
}

pub async fn feedback_patterns(State(state): State<Arc<AppState>>, headers: HeaderMap) -> AppResult<Json<review_store::FeedbackDistribution>> {
    let org_id = org_id_from_headers(&headers)?;
    Ok(Json(state.store.feedback.distribution_for_org(org_id).await?))
}

#[derive(Serialize)]
pub struct LearnedPreference {
    pub file_path: String,
    pub line_number: u32,
}

#[derive(Serialize)]
pub struct FeedbackPreferencesResponse {
    pub suppressed: Vec<LearnedPreference>,
}

pub async fn feedback_preferences(State(state): State<Arc<AppState>>, headers: HeaderMap) -> AppResult<Json<FeedbackPreferencesResponse>> {
    let org_id = org_id_from_headers(&headers)?;
    let locations = state
        .store
        .feedback
        .suppressed_locations_for_org(org_id, DEFAULT_SUPPRESSION_THRESHOLD, DEFAULT_LEARNING_WINDOW_DAYS)
        .await?;

    Ok(Json(FeedbackPreferencesResponse {
        suppressed: locations.into_iter().map(|(file_path, line_number)| LearnedPreference { file_path, line_number }).collect(),
    }))
}
