//! Publisher (spec.md §4.K): assembles one atomic forge review
//! submission — body, recommendation, and the postable inline comments —
//! and submits it in a single call, with author-is-bot demotion.
//!
//! Generalizes `mr-reviewer/src/publish/gitlab.rs`'s per-draft posting
//! loop (one Discussions-API call per comment, guarded by a
//! `tokio::sync::Semaphore`) into the spec's single atomic submission:
//! this forge capability (`ForgeClient::create_review`) already accepts
//! body + event + every comment in one call, so there is no
//! concurrency to bound here — the semaphore pattern the teacher needed
//! for N HTTP calls has no counterpart when there is only one.

pub mod body;

use review_forge::{ForgeClient, ForgeError, InlineComment, PrAuthor, Result as ForgeResult, ReviewEvent, ReviewSubmission, Side};
use review_postprocess::{AggregatedReview, Recommendation};
use tracing::{info, warn};

fn recommendation_to_event(rec: Recommendation) -> ReviewEvent {
    match rec {
        Recommendation::RequestChanges => ReviewEvent::RequestChanges,
        Recommendation::Comment => ReviewEvent::Comment,
        Recommendation::Approve => ReviewEvent::Approve,
    }
}

/// Builds the submission from a post-processed review. `commit_id` is
/// the PR's head SHA; every comment carries the hidden idempotency
/// marker described in `body::idempotency_marker`.
pub fn build_submission(commit_id: impl Into<String>, review: &AggregatedReview) -> ReviewSubmission {
    let comments = review
        .postable
        .iter()
        .map(|f| InlineComment { path: f.file.clone(), line: f.line, body: body::render_comment_body(f), side: Side::Right })
        .collect();

    ReviewSubmission {
        commit_id: commit_id.into(),
        body: body::render_summary(review),
        event: recommendation_to_event(review.recommendation()),
        comments,
    }
}

/// True iff the event must be demoted: a forge cannot accept
/// `REQUEST_CHANGES` from its own app identity on its own PR (spec.md
/// §4.K "you cannot request changes on your own PR").
fn is_bot_authored(author: &PrAuthor) -> bool {
    author.is_bot
}

fn demote(submission: &mut ReviewSubmission) {
    if submission.event == ReviewEvent::RequestChanges {
        submission.event = ReviewEvent::Comment;
    }
}

/// Submits `submission` to `repo_ident`/`pr_number`, demoting
/// `REQUEST_CHANGES` to `COMMENT` up front when the PR author is the
/// authenticated bot identity, and retrying once with the demotion
/// applied if the forge rejects the first attempt while the event is
/// still `REQUEST_CHANGES` (spec.md §4.K: "If the forge returns the same
/// error post-hoc, retry once with the demotion applied"). The
/// submission is always exactly one or two API calls; comments are never
/// posted individually.
pub async fn publish(
    forge: &ForgeClient,
    repo_ident: &str,
    pr_number: u64,
    author: &PrAuthor,
    mut submission: ReviewSubmission,
) -> ForgeResult<()> {
    if is_bot_authored(author) && submission.event == ReviewEvent::RequestChanges {
        info!(repo_ident, pr_number, "demoting REQUEST_CHANGES to COMMENT: PR authored by the app itself");
        demote(&mut submission);
    }

    match forge.create_review(repo_ident, pr_number, &submission).await {
        Ok(()) => {
            info!(repo_ident, pr_number, event = ?submission.event, comments = submission.comments.len(), "review published");
            Ok(())
        }
        Err(ForgeError::Permanent(msg)) if submission.event == ReviewEvent::RequestChanges => {
            warn!(repo_ident, pr_number, error = %msg, "submission rejected with REQUEST_CHANGES, retrying once demoted");
            demote(&mut submission);
            forge.create_review(repo_ident, pr_number, &submission).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_types::{Finding, Severity};

    fn sample_review(severity: Severity) -> AggregatedReview {
        let mut review = AggregatedReview::default();
        review.record(Finding { file: "a.rs".into(), line: 1, severity, category: "bug".into(), message: "oops".into(), fix: None });
        review
    }

    #[test]
    fn error_recommendation_maps_to_request_changes() {
        let review = sample_review(Severity::Error);
        let submission = build_submission("abc", &review);
        assert_eq!(submission.event, ReviewEvent::RequestChanges);
        assert_eq!(submission.comments.len(), 1);
    }

    #[test]
    fn warning_recommendation_maps_to_comment() {
        let review = sample_review(Severity::Warning);
        let submission = build_submission("abc", &review);
        assert_eq!(submission.event, ReviewEvent::Comment);
    }

    #[test]
    fn approve_has_no_comments_when_no_findings() {
        let review = AggregatedReview::default();
        let submission = build_submission("abc", &review);
        assert_eq!(submission.event, ReviewEvent::Approve);
        assert!(submission.comments.is_empty());
    }
}
