//! `POST /webhooks/{github|gitlab}` (spec.md §6 "Webhook ingress").
//! Generalizes the teacher's `trigger_mr_route.rs` shared-secret check
//! into full per-platform signature verification plus event
//! classification, admission, and enqueue.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use axum::body::Bytes;
use review_store::Store;
use review_types::{Organization, Platform, Repository, Review};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::core::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::webhooks::events::{classify_github, classify_gitlab, Classification, IntakeError};
use crate::webhooks::payload::decode_body;
use crate::webhooks::signature::{constant_time_eq, verify_hmac_sha256};
use review_admission::AdmissionDecision;

#[derive(Serialize)]
struct WebhookAck {
    status: &'static str,
}

/// `POST /webhooks/:platform`. Verifies the signature against the *raw*
/// body before any decoding happens (spec.md §4.A), so the handler takes
/// `Bytes` rather than a `Json<...>` extractor.
#[instrument(name = "webhook_ingress", skip(state, headers, raw_body), fields(platform = %platform))]
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    raw_body: Bytes,
) -> Response {
    match handle_webhook_inner(state, &platform, headers, raw_body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn handle_webhook_inner(
    state: Arc<AppState>,
    platform_str: &str,
    headers: HeaderMap,
    raw_body: Bytes,
) -> AppResult<Response> {
    let platform = match platform_str {
        "github" => Platform::GitHub,
        "gitlab" => Platform::GitLab,
        other => return Err(AppError::BadRequest(format!("unrecognised webhook platform: {other}"))),
    };

    verify_signature(&state, platform, &headers, &raw_body)?;

    let content_type = headers.get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let body = decode_body(content_type, &raw_body)?;

    let classification = match platform {
        Platform::GitHub => {
            let event_name = headers
                .get("x-github-event")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| IntakeError::MalformedPayload("missing X-GitHub-Event header".to_string()))?;
            classify_github(event_name, &body)?
        }
        Platform::GitLab => classify_gitlab(&body)?,
        Platform::Bitbucket => return Ok(ack()),
    };

    match classification {
        Classification::Ignored => Ok(ack()),
        Classification::Trigger(trigger) => {
            admit_and_enqueue(&state.store, &state, trigger).await?;
            Ok(ack())
        }
        Classification::ReenqueueLatest { platform, repo_external_id, pr_number } => {
            reenqueue_latest(&state, platform, &repo_external_id, pr_number).await?;
            Ok(ack())
        }
    }
}

fn verify_signature(state: &AppState, platform: Platform, headers: &HeaderMap, raw_body: &[u8]) -> AppResult<()> {
    match platform {
        Platform::GitHub => {
            let secret = state
                .config
                .github_webhook_secret
                .as_deref()
                .ok_or(IntakeError::InvalidSignature)?;
            let signature = headers
                .get("x-hub-signature-256")
                .and_then(|v| v.to_str().ok())
                .ok_or(IntakeError::InvalidSignature)?;
            if !verify_hmac_sha256(secret.as_bytes(), raw_body, signature) {
                return Err(IntakeError::InvalidSignature.into());
            }
            Ok(())
        }
        Platform::GitLab => {
            let secret = state
                .config
                .gitlab_webhook_secret
                .as_deref()
                .ok_or(IntakeError::InvalidSignature)?;
            let token = headers
                .get("x-gitlab-token")
                .and_then(|v| v.to_str().ok())
                .ok_or(IntakeError::InvalidSignature)?;
            if !constant_time_eq(secret.as_bytes(), token.as_bytes()) {
                return Err(IntakeError::InvalidSignature.into());
            }
            Ok(())
        }
        Platform::Bitbucket => Err(IntakeError::InvalidSignature.into()),
    }
}

fn ack() -> Response {
    Json(WebhookAck { status: "ok" }).into_response()
}

/// Resolves the owning Organization and Repository, runs admission, and
/// (on admit) creates and enqueues a Review. A plan-limit rejection is a
/// normal 200 ack — the trigger was accepted and handled, just not
/// turned into work (spec.md §4.J: "reject, no retry").
async fn admit_and_enqueue(store: &Store, state: &AppState, trigger: review_types::ReviewTrigger) -> AppResult<()> {
    let org = store
        .organizations
        .get_or_create(&trigger.org_slug, || Organization::new(trigger.org_slug.clone(), review_types::Plan::Free))
        .await;

    let repo = store
        .repositories
        .upsert(org.id, trigger.platform, &trigger.repo_external_id, || {
            Repository::new(org.id, trigger.platform, trigger.repo_external_id.clone(), trigger.repo_full_name.clone(), trigger.is_private)
        })
        .await;

    let repo_count = store.repositories.count_for_org(org.id).await as u32;
    let decision = review_admission::decide(&store.reviews, &org, repo_count, repo.is_private, repo.is_active).await;

    match decision {
        AdmissionDecision::Reject { reason } => {
            info!(org_id = %org.id, repo = %repo.full_name, reason = ?reason, "review trigger rejected by admission");
            Ok(())
        }
        AdmissionDecision::Admit { priority } => {
            if let Some(active) = store.reviews.active_for_pr(repo.id, trigger.pr_number).await? {
                if active.head_sha == trigger.head_sha {
                    // Duplicate delivery of the same (repo, pr, sha) while
                    // already active: no additional Review row (spec.md §8
                    // idempotence law).
                    return Ok(());
                }
                // spec.md §5: "new triggers for the same pair ... either
                // coalesce or cancel the in-flight review". A different
                // head_sha cancels rather than coalesces: mark the old
                // review superseded so it never publishes. If it hasn't
                // been claimed yet, `claim_for_processing` will find it no
                // longer `Pending` and drop it; if a worker already
                // claimed it, `review-worker::pipeline::run`'s pre-publish
                // guard re-checks this row and aborts before posting
                // (spec.md §8 scenario 2: "allowed to complete but not
                // posted").
                store.reviews.supersede(active.id, "superseded by newer head_sha").await?;
                info!(review_id = %active.id, org_id = %org.id, repo = %repo.full_name, new_head_sha = %trigger.head_sha, "in-flight review superseded by newer head_sha");
            }

            let review = Review::new(org.id, repo.id, trigger.pr_number, trigger.head_sha.clone(), trigger.base_branch.clone());
            let review_id = review.id;
            store.reviews.create_review(review).await?;
            state.queue.enqueue(review_id, priority).await;
            info!(review_id = %review_id, org_id = %org.id, repo = %repo.full_name, priority, "review admitted and enqueued");
            Ok(())
        }
    }
}

async fn reenqueue_latest(state: &AppState, platform: Platform, repo_external_id: &str, pr_number: u64) -> AppResult<()> {
    let Some(repo) = state.store.repositories.find_by_external_id(platform, repo_external_id).await? else {
        warn!(repo_external_id, "command invocation for unknown repository, ignoring");
        return Ok(());
    };
    let Some(review) = state.store.reviews.latest_for_pr(repo.id, pr_number).await? else {
        warn!(repo_external_id, pr_number, "command invocation with no prior review on file, ignoring");
        return Ok(());
    };

    if review.status.is_active() {
        // Already in flight; the command is a no-op rather than a
        // duplicate enqueue.
        return Ok(());
    }

    let fresh = Review::new(review.org_id, review.repo_id, review.pr_number, review.head_sha.clone(), review.base_branch.clone());
    let review_id = fresh.id;
    state.store.reviews.create_review(fresh).await?;
    // Command invocations are user-initiated, so they get the highest
    // manual-retry priority rather than their plan's default.
    state.queue.enqueue(review_id, 1).await;
    info!(review_id = %review_id, pr_number, "re-enqueued review via command invocation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hmac::{Hmac, Mac};
    use http_body_util::BodyExt;
    use review_config::{AiProvider, Config};
    use review_metrics::Metrics;
    use review_queue::{BackoffPolicy, JobQueue};
    use review_store::Store;
    use sha2::Sha256;
    use tower::ServiceExt;

    use super::*;
    use crate::build_router;

    const SECRET: &str = "test-secret";

    fn test_config() -> Config {
        Config {
            port: 0,
            database_url: None,
            redis_url: None,
            base_url: None,
            ai_provider: AiProvider::OpenAi,
            openai_api_key: None,
            claude_api_key: None,
            repos_path: "/tmp/review-api-tests".to_string(),
            max_repo_age_hours: 24,
            max_files_per_review: 300,
            max_concurrent_reviews: 5,
            review_timeout_ms: 60_000,
            review_cache_ttl_hours: 24,
            enable_incremental_reviews: true,
            enable_codebase_indexing: false,
            rust_indexer_url: None,
            analyzer_bin: "review-analyzer".to_string(),
            github_webhook_secret: Some(SECRET.to_string()),
            gitlab_webhook_secret: Some(SECRET.to_string()),
            github_app_id: None,
            github_private_key_path: None,
            gitlab_token: None,
            gitlab_api_base: None,
        }
    }

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(test_config()),
            Arc::new(Store::new()),
            Arc::new(JobQueue::new(BackoffPolicy::default())),
            Arc::new(Metrics::new()),
        ))
    }

    fn sign(body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn gh_pr_body() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "action": "opened",
            "number": 1,
            "pull_request": {
                "head": {"sha": "abc123", "ref": "feature"},
                "base": {"sha": "base0", "ref": "main"},
                "user": {"login": "alice", "type": "User"}
            },
            "repository": {
                "full_name": "acme/widgets",
                "private": false,
                "clone_url": "https://github.com/acme/widgets.git"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn valid_pull_request_event_is_admitted_and_enqueued() {
        let state = test_state();
        let router = build_router(state.clone());
        let body = gh_pr_body();

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("content-type", "application/json")
            .header("x-github-event", "pull_request")
            .header("x-hub-signature-256", sign(&body))
            .body(Body::from(body))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats = state.queue.inspect().await;
        assert_eq!(stats.pending, 1);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let state = test_state();
        let router = build_router(state);
        let body = gh_pr_body();

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("content-type", "application/json")
            .header("x-github-event", "pull_request")
            .header("x-hub-signature-256", "sha256=deadbeef")
            .body(Body::from(body))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn ping_event_is_acked_without_enqueue() {
        let state = test_state();
        let router = build_router(state.clone());
        let body = serde_json::to_vec(&serde_json::json!({"zen": "hi"})).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("content-type", "application/json")
            .header("x-github-event", "ping")
            .header("x-hub-signature-256", sign(&body))
            .body(Body::from(body))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");

        assert_eq!(state.queue.inspect().await.pending, 0);
    }

    #[tokio::test]
    async fn unknown_platform_is_bad_request() {
        let state = test_state();
        let router = build_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/bitbucket-server")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
