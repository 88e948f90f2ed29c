use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{OrgId, RepoId, ReviewId};

/// Lifecycle state of a `Review`. Allowed edges (spec.md §4 "State machine"):
/// `Pending -> Processing` (claim), `Processing -> Completed` (success),
/// `Processing -> Failed` (exec error or max attempts), `Failed -> Pending`
/// (manual retry), and `Processing -> Pending` on visibility-timeout
/// redelivery iff the claim token has expired. Terminal states never
/// spontaneously transition.
///
/// One additional edge, `Pending -> Failed`, covers superseding: spec.md
/// §5 requires that a newer trigger for the same `(repo_id, pr_number)`
/// either coalesce or cancel the review it supersedes. A still-`Pending`
/// review has not been claimed by any worker, so cancelling it is a
/// direct `Failed` transition rather than routing through `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReviewStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewStatus::Completed | ReviewStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, ReviewStatus::Pending | ReviewStatus::Processing)
    }

    /// True iff `self -> to` is one of the edges the state machine allows.
    pub fn can_transition_to(self, to: ReviewStatus) -> bool {
        use ReviewStatus::*;
        matches!(
            (self, to),
            (Pending, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Pending, Failed)
                | (Failed, Pending)
                | (Processing, Pending)
        )
    }
}

/// One `(repo, pr_number, head_sha)` unit of work. Invariant: at most one
/// *active* (pending or processing) Review per `(repo_id, pr_number,
/// head_sha)` triple (enforced by `review-store`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    /// Denormalized onto the row so the Job Store can offer the
    /// `(org_id, created_at DESC)` index spec.md §4.C names without a join.
    pub org_id: OrgId,
    pub repo_id: RepoId,
    pub pr_number: u64,
    pub head_sha: String,
    pub base_branch: String,
    pub status: ReviewStatus,
    /// Opaque JSON blob of findings + recommendation produced by
    /// `review-postprocess`; `None` until completion.
    pub result: Option<Value>,
    pub comments_posted: u32,
    pub duration_ms: Option<u64>,
    pub ai_provider: Option<String>,
    /// Lifetime retry counter, independent of queue-level attempts, bounding
    /// total cost per spec.md §7.
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn new(
        org_id: OrgId,
        repo_id: RepoId,
        pr_number: u64,
        head_sha: impl Into<String>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            org_id,
            repo_id,
            pr_number,
            head_sha: head_sha.into(),
            base_branch: base_branch.into(),
            status: ReviewStatus::Pending,
            result: None,
            comments_posted: 0,
            duration_ms: None,
            ai_provider: None,
            retry_count: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
