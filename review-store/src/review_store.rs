use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use review_types::{OrgId, RepoId, Review, ReviewId, ReviewStatus};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{Result, StoreError};

/// `trait ReviewStore` (spec.md §4.C): `CreateReview`, `ClaimForProcessing`,
/// `MarkCompleted`, `MarkFailed`, `GetByPRAndSHA`, plus `count_since` for
/// the Admission Controller's monthly meter and `retry` for the
/// `failed -> pending` manual-retry edge.
#[derive(Default)]
pub struct ReviewStore {
    rows: RwLock<HashMap<ReviewId, Review>>,
    /// Emulates the `(org_id, created_at DESC)` index.
    by_org_created: RwLock<HashMap<OrgId, BTreeSet<(DateTime<Utc>, ReviewId)>>>,
    /// Emulates the `(repo_id, pr_number)` index, and is what enforces
    /// "at most one active review per (repo, pr_number, head_sha)":
    /// active reviews for a `(repo_id, pr_number)` pair are tracked here
    /// regardless of head_sha, so a second trigger for the same PR can
    /// find the in-flight one even if the head_sha differs (spec.md §5
    /// "new triggers for the same pair ... either coalesce or cancel the
    /// in-flight review").
    by_repo_pr: RwLock<HashMap<(RepoId, u64), Vec<ReviewId>>>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_review(&self, review: Review) -> Result<ReviewId> {
        let id = review.id;
        self.by_org_created
            .write()
            .await
            .entry(review.org_id)
            .or_default()
            .insert((review.created_at, id));
        self.by_repo_pr
            .write()
            .await
            .entry((review.repo_id, review.pr_number))
            .or_default()
            .push(id);
        self.rows.write().await.insert(id, review);
        Ok(id)
    }

    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    /// Returns the single active (pending/processing) review for
    /// `(repo_id, pr_number)`, if any — the lookup the coalesce-vs-cancel
    /// decision in the worker pool's admission path uses.
    pub async fn active_for_pr(&self, repo_id: RepoId, pr_number: u64) -> Result<Option<Review>> {
        let ids = self
            .by_repo_pr
            .read()
            .await
            .get(&(repo_id, pr_number))
            .cloned()
            .unwrap_or_default();
        let rows = self.rows.read().await;
        Ok(ids.iter().filter_map(|id| rows.get(id)).find(|r| r.status.is_active()).cloned())
    }

    /// Most recently created review for `(repo_id, pr_number)`, regardless
    /// of status. Used by the `issue_comment`/`note` command-invocation
    /// path (`/review`, `/recheck`) to re-enqueue the existing tracked
    /// review instead of resolving a fresh head SHA via the forge.
    pub async fn latest_for_pr(&self, repo_id: RepoId, pr_number: u64) -> Result<Option<Review>> {
        let ids = self
            .by_repo_pr
            .read()
            .await
            .get(&(repo_id, pr_number))
            .cloned()
            .unwrap_or_default();
        let rows = self.rows.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    pub async fn get_by_pr_and_sha(&self, repo_id: RepoId, pr_number: u64, head_sha: &str) -> Result<Option<Review>> {
        let ids = self
            .by_repo_pr
            .read()
            .await
            .get(&(repo_id, pr_number))
            .cloned()
            .unwrap_or_default();
        let rows = self.rows.read().await;
        Ok(ids.iter().filter_map(|id| rows.get(id)).find(|r| r.head_sha == head_sha).cloned())
    }

    /// `UPDATE reviews SET status = 'processing' WHERE id = ? AND status
    /// = 'pending'` — returns `true` iff the claim succeeded.
    pub async fn claim_for_processing(&self, id: ReviewId) -> Result<bool> {
        self.transition(id, ReviewStatus::Pending, ReviewStatus::Processing).await.map(|_| true).or_else(|e| match e {
            StoreError::Conflict(_) => Ok(false),
            other => Err(other),
        })
    }

    pub async fn mark_completed(&self, id: ReviewId, result: Value, duration_ms: u64) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if row.status != ReviewStatus::Processing {
            return Err(StoreError::Conflict(id.to_string()));
        }
        row.status = ReviewStatus::Completed;
        row.result = Some(result);
        row.duration_ms = Some(duration_ms);
        row.completed_at = Some(Utc::now());
        debug!(review_id = %id, "review marked completed");
        Ok(())
    }

    pub async fn mark_failed(&self, id: ReviewId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !row.status.can_transition_to(ReviewStatus::Failed) {
            return Err(StoreError::Conflict(id.to_string()));
        }
        row.status = ReviewStatus::Failed;
        row.result = Some(serde_json::json!({ "error": reason }));
        row.completed_at = Some(Utc::now());
        debug!(review_id = %id, "review marked failed");
        Ok(())
    }

    /// `Pending|Processing -> Failed`, triggered when a newer-head_sha
    /// trigger arrives for the same `(repo_id, pr_number)` (spec.md §5;
    /// §8 scenario 2: "first review is superseded ... allowed to complete
    /// but not posted"). Unlike `mark_failed`, this accepts either active
    /// starting state, since the review being superseded may not yet have
    /// been claimed by a worker. A no-op if the review already reached a
    /// terminal state (nothing left to supersede).
    pub async fn supersede(&self, id: ReviewId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !row.status.is_active() {
            return Ok(());
        }
        row.status = ReviewStatus::Failed;
        row.result = Some(serde_json::json!({ "error": reason }));
        row.completed_at = Some(Utc::now());
        debug!(review_id = %id, "review superseded by newer head_sha");
        Ok(())
    }

    /// `processing -> pending` redelivery, allowed only when the caller
    /// has already established the claim token expired (the queue is the
    /// one that knows that; this method just performs the CAS).
    pub async fn redeliver(&self, id: ReviewId) -> Result<()> {
        self.transition(id, ReviewStatus::Processing, ReviewStatus::Pending).await
    }

    /// `failed -> pending` manual retry via `POST /reviews/{id}/retry`.
    pub async fn retry(&self, id: ReviewId) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if row.status != ReviewStatus::Failed {
            return Err(StoreError::Conflict(id.to_string()));
        }
        row.status = ReviewStatus::Pending;
        row.retry_count += 1;
        Ok(())
    }

    async fn transition(&self, id: ReviewId, expected: ReviewStatus, to: ReviewStatus) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if row.status != expected {
            return Err(StoreError::Conflict(id.to_string()));
        }
        row.status = to;
        Ok(())
    }

    /// `count where org_id=? AND created_at >= start-of-calendar-month`.
    /// Not transactional with `create_review` (spec.md §9 Open Question):
    /// two concurrent admissions may each observe count=N and both admit,
    /// pushing the true count to N+2. Accepted because the bound is
    /// billing-centric, not security-critical (spec.md §4.B).
    pub async fn count_since(&self, org_id: OrgId, since: DateTime<Utc>) -> Result<u64> {
        let by_org = self.by_org_created.read().await;
        let Some(set) = by_org.get(&org_id) else {
            return Ok(0);
        };
        Ok(set.iter().filter(|(created_at, _)| *created_at >= since).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_types::RepoId;

    fn new_review(org: OrgId, repo: RepoId) -> Review {
        Review::new(org, repo, 1, "abc123", "main")
    }

    #[tokio::test]
    async fn claim_only_succeeds_once() {
        let store = ReviewStore::new();
        let org = OrgId::new();
        let repo = RepoId::new();
        let review = new_review(org, repo);
        let id = review.id;
        store.create_review(review).await.unwrap();

        assert!(store.claim_for_processing(id).await.unwrap());
        assert!(!store.claim_for_processing(id).await.unwrap());
    }

    #[tokio::test]
    async fn mark_completed_requires_processing_state() {
        let store = ReviewStore::new();
        let org = OrgId::new();
        let repo = RepoId::new();
        let review = new_review(org, repo);
        let id = review.id;
        store.create_review(review).await.unwrap();

        let err = store.mark_completed(id, serde_json::json!({}), 10).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.claim_for_processing(id).await.unwrap();
        store.mark_completed(id, serde_json::json!({}), 10).await.unwrap();
        let row = store.get(id).await.unwrap().unwrap();
        assert_eq!(row.status, ReviewStatus::Completed);
    }

    #[tokio::test]
    async fn count_since_respects_window() {
        let store = ReviewStore::new();
        let org = OrgId::new();
        let repo = RepoId::new();
        store.create_review(new_review(org, repo)).await.unwrap();
        store.create_review(new_review(org, repo)).await.unwrap();

        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(store.count_since(org, future).await.unwrap(), 0);
        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(store.count_since(org, past).await.unwrap(), 2);
    }
}
