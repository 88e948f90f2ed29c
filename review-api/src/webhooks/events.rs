//! Decodes a forge's untyped JSON payload into a tagged `WebhookEvent`
//! per the Design Note "dynamic map-typed payloads -> tagged variants":
//! downstream code (the intake route) matches on a sum type and never
//! indexes into a `serde_json::Value` bag itself.

use review_types::{Platform, ReviewTrigger};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
}

/// What the webhook route should do once a payload has been classified.
/// `Ignored` covers `ping` and any event/action this core doesn't act on
/// (spec.md §4.A: "UnknownEvent ... 200 (ignored)" — note an *unknown*
/// event name is a 200, not a 400; only a malformed body is a 400).
pub enum Classification {
    Ignored,
    Trigger(ReviewTrigger),
    /// `issue_comment` command invocation: re-enqueues the most recent
    /// review already on file for this `(repo, pr_number)` rather than
    /// resolving a fresh head SHA, since the comment payload itself
    /// carries no diff-relevant state (spec.md lists `issue_comment` as
    /// a recognised event but names no new fields it contributes beyond
    /// "command invocation").
    ReenqueueLatest { platform: Platform, repo_external_id: String, pr_number: u64 },
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
    #[serde(default)]
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhRepository {
    full_name: String,
    private: bool,
    clone_url: String,
}

#[derive(Debug, Deserialize)]
struct GhPrRef {
    sha: String,
    #[serde(rename = "ref")]
    git_ref: String,
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    head: GhPrRef,
    base: GhPrRef,
    #[allow(dead_code)]
    user: GhUser,
}

#[derive(Debug, Deserialize)]
struct GhInstallation {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct GhPullRequestEvent {
    action: String,
    number: u64,
    pull_request: GhPullRequest,
    repository: GhRepository,
    #[serde(default)]
    installation: Option<GhInstallation>,
}

#[derive(Debug, Deserialize)]
struct GhIssueRef {
    number: u64,
    #[serde(default)]
    pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GhComment {
    body: String,
}

#[derive(Debug, Deserialize)]
struct GhIssueCommentEvent {
    action: String,
    issue: GhIssueRef,
    repository: GhRepository,
    comment: GhComment,
}

const PR_TRIGGERING_ACTIONS: &[&str] = &["opened", "synchronize", "reopened"];
const REVIEW_COMMANDS: &[&str] = &["/review", "/recheck"];

/// Classifies a decoded GitHub webhook body given its `X-GitHub-Event`
/// header value. Recognised events per spec.md §4.A: `installation`,
/// `pull_request`, `issue_comment`; everything else (and `ping`) is
/// ignored.
pub fn classify_github(event_name: &str, body: &Value) -> Result<Classification, IntakeError> {
    match event_name {
        "ping" => Ok(Classification::Ignored),
        "pull_request" => {
            let event: GhPullRequestEvent =
                serde_json::from_value(body.clone()).map_err(|e| IntakeError::MalformedPayload(e.to_string()))?;
            if !PR_TRIGGERING_ACTIONS.contains(&event.action.as_str()) {
                return Ok(Classification::Ignored);
            }
            Ok(Classification::Trigger(ReviewTrigger {
                org_slug: event.repository.full_name.split('/').next().unwrap_or_default().to_string(),
                platform: Platform::GitHub,
                repo_external_id: event.repository.full_name.clone(),
                repo_full_name: event.repository.full_name,
                is_private: event.repository.private,
                pr_number: event.number,
                head_sha: event.pull_request.head.sha,
                base_branch: event.pull_request.base.git_ref,
                clone_url: event.repository.clone_url,
            }))
        }
        "issue_comment" => {
            let event: GhIssueCommentEvent =
                serde_json::from_value(body.clone()).map_err(|e| IntakeError::MalformedPayload(e.to_string()))?;
            if event.action != "created" || event.issue.pull_request.is_none() {
                return Ok(Classification::Ignored);
            }
            let command_matched = REVIEW_COMMANDS.iter().any(|cmd| event.comment.body.trim().starts_with(cmd));
            if !command_matched {
                return Ok(Classification::Ignored);
            }
            Ok(Classification::ReenqueueLatest {
                platform: Platform::GitHub,
                repo_external_id: event.repository.full_name,
                pr_number: event.issue.number,
            })
        }
        "installation" => {
            // `created`/`deleted`/`suspend`/`unsuspend` affect the
            // Organization<->installation linkage, which is wired up
            // lazily the next time a PR event arrives for that org
            // rather than eagerly here; Event Intake only needs to
            // accept and acknowledge the event.
            Ok(Classification::Ignored)
        }
        _ => Ok(Classification::Ignored),
    }
}

#[derive(Debug, Deserialize)]
struct GlUser {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlProject {
    path_with_namespace: String,
    #[serde(default)]
    visibility_level: i64,
    git_http_url: String,
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct GlLastCommit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GlObjectAttributes {
    action: Option<String>,
    iid: u64,
    source_branch: String,
    target_branch: String,
    last_commit: GlLastCommit,
}

#[derive(Debug, Deserialize)]
struct GlMergeRequestEvent {
    object_attributes: GlObjectAttributes,
    project: GlProject,
    #[serde(default)]
    user: Option<GlUser>,
}

/// GitLab repos default to private (`visibility_level` 0); `20` is
/// public. Mirrors GitLab's own `visibility_level` enum rather than
/// inventing a separate boolean the payload doesn't carry directly.
const GITLAB_PUBLIC_VISIBILITY: i64 = 20;

/// Classifies a decoded GitLab webhook body given its `object_kind`
/// field (GitLab puts the event kind in the body, not only the
/// `X-Gitlab-Event` header, so the body is authoritative here).
pub fn classify_gitlab(body: &Value) -> Result<Classification, IntakeError> {
    let object_kind = body.get("object_kind").and_then(Value::as_str).unwrap_or_default();
    match object_kind {
        "merge_request" => {
            let event: GlMergeRequestEvent =
                serde_json::from_value(body.clone()).map_err(|e| IntakeError::MalformedPayload(e.to_string()))?;
            let action = event.object_attributes.action.as_deref().unwrap_or_default();
            if !matches!(action, "open" | "update" | "reopen") {
                return Ok(Classification::Ignored);
            }
            Ok(Classification::Trigger(ReviewTrigger {
                org_slug: event.project.namespace.clone(),
                platform: Platform::GitLab,
                repo_external_id: event.project.path_with_namespace.clone(),
                repo_full_name: event.project.path_with_namespace,
                is_private: event.project.visibility_level < GITLAB_PUBLIC_VISIBILITY,
                pr_number: event.object_attributes.iid,
                head_sha: event.object_attributes.last_commit.id,
                base_branch: event.object_attributes.target_branch,
                clone_url: event.project.git_http_url,
            }))
        }
        "note" => {
            // GitLab's equivalent of `issue_comment`: a comment on a
            // merge request. Same command-invocation treatment as
            // GitHub, resolved against `merge_request.iid` rather than
            // `issue.number`.
            let mr_iid = body
                .get("merge_request")
                .and_then(|mr| mr.get("iid"))
                .and_then(Value::as_u64);
            let project_path = body
                .get("project")
                .and_then(|p| p.get("path_with_namespace"))
                .and_then(Value::as_str);
            let comment_body = body.get("object_attributes").and_then(|oa| oa.get("note")).and_then(Value::as_str);
            let (Some(mr_iid), Some(project_path), Some(comment_body)) = (mr_iid, project_path, comment_body) else {
                return Ok(Classification::Ignored);
            };
            if !REVIEW_COMMANDS.iter().any(|cmd| comment_body.trim().starts_with(cmd)) {
                return Ok(Classification::Ignored);
            }
            Ok(Classification::ReenqueueLatest {
                platform: Platform::GitLab,
                repo_external_id: project_path.to_string(),
                pr_number: mr_iid,
            })
        }
        _ => Ok(Classification::Ignored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gh_pr_payload(action: &str) -> Value {
        json!({
            "action": action,
            "number": 42,
            "pull_request": {
                "head": {"sha": "abc123", "ref": "feature"},
                "base": {"sha": "base0", "ref": "main"},
                "user": {"login": "alice", "type": "User"}
            },
            "repository": {
                "full_name": "acme/widgets",
                "private": false,
                "clone_url": "https://github.com/acme/widgets.git"
            },
            "installation": {"id": 999}
        })
    }

    #[test]
    fn github_pull_request_opened_triggers() {
        let classification = classify_github("pull_request", &gh_pr_payload("opened")).unwrap();
        match classification {
            Classification::Trigger(t) => {
                assert_eq!(t.pr_number, 42);
                assert_eq!(t.head_sha, "abc123");
                assert_eq!(t.base_branch, "main");
                assert_eq!(t.platform, Platform::GitHub);
            }
            _ => panic!("expected a trigger"),
        }
    }

    #[test]
    fn github_pull_request_labeled_is_ignored() {
        let classification = classify_github("pull_request", &gh_pr_payload("labeled")).unwrap();
        assert!(matches!(classification, Classification::Ignored));
    }

    #[test]
    fn github_ping_is_ignored() {
        let classification = classify_github("ping", &json!({"zen": "hi"})).unwrap();
        assert!(matches!(classification, Classification::Ignored));
    }

    #[test]
    fn github_unknown_event_is_ignored_not_error() {
        let classification = classify_github("star", &json!({})).unwrap();
        assert!(matches!(classification, Classification::Ignored));
    }

    #[test]
    fn github_issue_comment_command_reenqueues() {
        let payload = json!({
            "action": "created",
            "issue": {"number": 7, "pull_request": {"url": "https://api.github.com/..."}},
            "repository": {"full_name": "acme/widgets", "private": false, "clone_url": "x"},
            "comment": {"body": "/review please"}
        });
        let classification = classify_github("issue_comment", &payload).unwrap();
        match classification {
            Classification::ReenqueueLatest { pr_number, .. } => assert_eq!(pr_number, 7),
            _ => panic!("expected a reenqueue classification"),
        }
    }

    #[test]
    fn github_issue_comment_without_command_is_ignored() {
        let payload = json!({
            "action": "created",
            "issue": {"number": 7, "pull_request": {"url": "x"}},
            "repository": {"full_name": "acme/widgets", "private": false, "clone_url": "x"},
            "comment": {"body": "nice work"}
        });
        let classification = classify_github("issue_comment", &payload).unwrap();
        assert!(matches!(classification, Classification::Ignored));
    }

    #[test]
    fn gitlab_merge_request_open_triggers() {
        let payload = json!({
            "object_kind": "merge_request",
            "project": {
                "path_with_namespace": "acme/widgets",
                "visibility_level": 0,
                "git_http_url": "https://gitlab.com/acme/widgets.git",
                "namespace": "acme"
            },
            "object_attributes": {
                "action": "open",
                "iid": 5,
                "source_branch": "feature",
                "target_branch": "main",
                "last_commit": {"id": "deadbeef"}
            }
        });
        let classification = classify_gitlab(&payload).unwrap();
        match classification {
            Classification::Trigger(t) => {
                assert_eq!(t.pr_number, 5);
                assert_eq!(t.head_sha, "deadbeef");
                assert!(t.is_private);
            }
            _ => panic!("expected a trigger"),
        }
    }

    #[test]
    fn gitlab_unrecognised_object_kind_is_ignored() {
        let classification = classify_gitlab(&json!({"object_kind": "push"})).unwrap();
        assert!(matches!(classification, Classification::Ignored));
    }
}
