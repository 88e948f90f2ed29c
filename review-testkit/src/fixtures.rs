//! Builders for the handful of domain records most tests need, so a test
//! reads as "given this org, this repo, this review" instead of
//! re-deriving every required field inline.

use review_analyzer::RawFinding;
use review_forge::PrFile;
use review_types::{Organization, Plan, Platform, Repository, Review, ReviewTrigger};

/// A `Free`-plan organization with a random slug, ready to pass straight
/// into `review-store`/`review-admission`.
pub fn organization() -> Organization {
    Organization::new(format!("acme-{}", uuid::Uuid::new_v4()), Plan::Free)
}

pub fn organization_with_plan(plan: Plan) -> Organization {
    Organization::new(format!("acme-{}", uuid::Uuid::new_v4()), plan)
}

pub fn repository(org: &Organization) -> Repository {
    Repository::new(org.id, Platform::GitHub, "123456", "acme/widgets", false)
}

pub fn private_repository(org: &Organization) -> Repository {
    Repository::new(org.id, Platform::GitHub, "654321", "acme/secret-widgets", true)
}

pub fn review(org: &Organization, repo: &Repository) -> Review {
    Review::new(org.id, repo.id, 42, "deadbeefcafe", "main")
}

pub fn review_trigger(platform: Platform) -> ReviewTrigger {
    ReviewTrigger {
        org_slug: "acme".to_string(),
        platform,
        repo_external_id: "123456".to_string(),
        repo_full_name: "acme/widgets".to_string(),
        is_private: false,
        pr_number: 42,
        head_sha: "deadbeefcafe".to_string(),
        base_branch: "main".to_string(),
        clone_url: "https://github.com/acme/widgets.git".to_string(),
    }
}

/// One changed file with a single-hunk unified diff adding `line_count`
/// lines, starting at new-file line 10.
pub fn pr_file(filename: &str, line_count: u32) -> PrFile {
    let mut patch = format!("@@ -9,0 +10,{line_count} @@\n");
    for i in 0..line_count {
        patch.push_str(&format!("+line {i}\n"));
    }
    PrFile { filename: filename.to_string(), patch: Some(patch) }
}

pub fn binary_pr_file(filename: &str) -> PrFile {
    PrFile { filename: filename.to_string(), patch: Some(format!("Binary files a/{filename} and b/{filename} differ")) }
}

pub fn raw_finding(file: &str, line: u32, severity: &str) -> RawFinding {
    RawFinding {
        file: file.to_string(),
        line,
        severity: severity.to_string(),
        category: "style".to_string(),
        message: "example finding".to_string(),
        fix: None,
    }
}
