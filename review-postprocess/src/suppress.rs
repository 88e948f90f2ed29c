//! Step 3: suppression — drop findings the tenant has repeatedly
//! dismissed at the same (file, line) within the learning window.

use chrono::{DateTime, Utc};
use review_types::OrgId;

pub const DEFAULT_SUPPRESSION_THRESHOLD: usize = 3;
pub const DEFAULT_LEARNING_WINDOW_DAYS: i64 = 30;

/// Read-only view onto dismissal history. `review-store`'s
/// `FeedbackStore` implements this directly; `review-testkit` supplies a
/// fake with a fixed count for tests that don't need a real store.
pub trait FeedbackIndex {
    fn dismissal_count_within(
        &self,
        org_id: OrgId,
        file: &str,
        line: u32,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = usize> + Send;
}

/// `review-store`'s `FeedbackStore` is the only real-world source of
/// dismissal history in this workspace; this impl is what lets
/// `review-worker` pass a live store straight into [`is_suppressed`]
/// without an intermediate adapter type.
impl FeedbackIndex for review_store::FeedbackStore {
    async fn dismissal_count_within(&self, org_id: OrgId, file: &str, line: u32, since: DateTime<Utc>) -> usize {
        self.dismissal_count_within(org_id, file, line, since).await.unwrap_or(0)
    }
}

pub async fn is_suppressed<F: FeedbackIndex>(
    index: &F,
    org_id: OrgId,
    file: &str,
    line: u32,
    threshold: usize,
    window_days: i64,
) -> bool {
    let since = Utc::now() - chrono::Duration::days(window_days);
    index.dismissal_count_within(org_id, file, line, since).await >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIndex(usize);
    impl FeedbackIndex for FixedIndex {
        async fn dismissal_count_within(&self, _: OrgId, _: &str, _: u32, _: DateTime<Utc>) -> usize {
            self.0
        }
    }

    #[tokio::test]
    async fn below_threshold_is_not_suppressed() {
        let idx = FixedIndex(2);
        assert!(!is_suppressed(&idx, OrgId::new(), "a.rs", 1, 3, 30).await);
    }

    #[tokio::test]
    async fn at_threshold_is_suppressed() {
        let idx = FixedIndex(3);
        assert!(is_suppressed(&idx, OrgId::new(), "a.rs", 1, 3, 30).await);
    }
}
