use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::OrgId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackDecision {
    Accepted,
    Dismissed,
    Fixed,
}

/// `(review_id, comment_id) -> decision`, indexed by `(org_id, file_path,
/// line_number)`. Written by the learning/feedback ingestion path
/// (out of scope here); consumed read-only by `review-postprocess` for
/// suppression. The `ON CONFLICT (review_id, comment_id) DO UPDATE` upsert
/// named in spec.md §9 is only correct if `comment_id` is stable across
/// analyzer runs — the analyzer contract (`review-analyzer`) guarantees
/// this by deriving it from `(file, line, category)` rather than letting
/// the analyzer mint an arbitrary one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub review_id: crate::ReviewId,
    pub comment_id: String,
    pub org_id: OrgId,
    pub file_path: String,
    pub line_number: u32,
    pub decision: FeedbackDecision,
    pub created_at: DateTime<Utc>,
}
