//! Admission Controller (spec.md §4.B): given a trigger and the owning
//! organization's plan, decides admit-with-priority or reject-with-reason.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use review_store::ReviewStore;
use review_types::{Organization, Plan};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    RepoLimitExceeded { max: u32 },
    MonthlyReviewLimitExceeded { max: u32 },
    PrivateReposNotAllowed,
    RepoInactive,
}

impl RejectionReason {
    /// User-visible text, safe to surface as a PR comment per spec.md §4.J
    /// ("Plan-limit rejection: reject, no retry; surface via a PR comment
    /// if feasible").
    pub fn message(&self) -> String {
        match self {
            RejectionReason::RepoLimitExceeded { max } => {
                format!("Your plan allows at most {max} active repositories.")
            }
            RejectionReason::MonthlyReviewLimitExceeded { max } => {
                format!("Your plan allows at most {max} reviews per calendar month.")
            }
            RejectionReason::PrivateReposNotAllowed => {
                "Your plan does not include private repository reviews.".to_string()
            }
            RejectionReason::RepoInactive => "This repository is not active for review.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admit { priority: i32 },
    Reject { reason: RejectionReason },
}

/// Start of the current UTC calendar month, used as the window for
/// `count_since` (spec.md §4.B).
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).single().expect("valid first-of-month")
}

/// Pure decision function over already-read counters: whether `repo_count`
/// (existing *active* repos for the org) and `monthly_count` (reviews
/// created since start-of-month) pass the plan's limits, and whether the
/// target repo being private is allowed.
pub fn admit(plan: Plan, repo_count: u32, monthly_count: u32, repo_is_private: bool, repo_is_active: bool) -> AdmissionDecision {
    let limits = plan.limits();

    if !repo_is_active {
        return AdmissionDecision::Reject { reason: RejectionReason::RepoInactive };
    }
    if repo_is_private && !limits.allows_private {
        return AdmissionDecision::Reject { reason: RejectionReason::PrivateReposNotAllowed };
    }
    if let Some(max) = limits.max_repos {
        if repo_count > max {
            return AdmissionDecision::Reject { reason: RejectionReason::RepoLimitExceeded { max } };
        }
    }
    if let Some(max) = limits.monthly_reviews {
        // "Monthly limit exactly at threshold -> reject; threshold-1 ->
        // accept" (spec.md §8): monthly_count is the count *before* this
        // review, so admitting at count == max would make it the
        // (max+1)th review.
        if monthly_count >= max {
            return AdmissionDecision::Reject { reason: RejectionReason::MonthlyReviewLimitExceeded { max } };
        }
    }
    AdmissionDecision::Admit { priority: limits.priority }
}

/// Reads the live counters from the Job Store and applies [`admit`].
/// The monthly-count read is intentionally not transactional with the
/// subsequent `CreateReview` (spec.md §9 Open Question): two concurrent
/// admissions may each observe `monthly_count = N` and both admit,
/// pushing the true count to `N + 2`. Accepted because the bound is
/// billing-centric, not security-critical.
pub async fn decide(
    store: &ReviewStore,
    org: &Organization,
    repo_count: u32,
    repo_is_private: bool,
    repo_is_active: bool,
) -> AdmissionDecision {
    let window_start = start_of_month(Utc::now());
    let monthly_count = store.count_since(org.id, window_start).await.unwrap_or(0) as u32;
    let decision = admit(org.plan, repo_count, monthly_count, repo_is_private, repo_is_active);
    info!(org_id = %org.id, ?decision, monthly_count, repo_count, "admission decision");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_rejects_private_repos() {
        let decision = admit(Plan::Free, 1, 0, true, true);
        assert_eq!(decision, AdmissionDecision::Reject { reason: RejectionReason::PrivateReposNotAllowed });
    }

    #[test]
    fn monthly_limit_boundary_exactly_at_threshold_rejects() {
        let decision = admit(Plan::Free, 1, 50, false, true);
        assert_eq!(
            decision,
            AdmissionDecision::Reject { reason: RejectionReason::MonthlyReviewLimitExceeded { max: 50 } }
        );
    }

    #[test]
    fn monthly_limit_one_under_threshold_admits() {
        let decision = admit(Plan::Free, 1, 49, false, true);
        assert_eq!(decision, AdmissionDecision::Admit { priority: 1 });
    }

    #[test]
    fn team_plan_has_unlimited_repos_and_reviews() {
        let decision = admit(Plan::Team, 10_000, 1_000_000, true, true);
        assert_eq!(decision, AdmissionDecision::Admit { priority: 50 });
    }

    #[test]
    fn inactive_repo_always_rejects() {
        let decision = admit(Plan::Enterprise, 0, 0, false, false);
        assert_eq!(decision, AdmissionDecision::Reject { reason: RejectionReason::RepoInactive });
    }
}
