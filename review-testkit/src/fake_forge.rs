//! Hand-rolled fake GitHub/GitLab HTTP server.
//!
//! `GitHubClient`/`GitLabClient` already take a `base_api: String`
//! constructor argument (see `review-forge`), so pointing one at this
//! server instead of `https://api.github.com` is the whole integration
//! seam — no trait object or `dyn Transport` needed. The pack carries no
//! `wiremock`-style crate, so this plays that role with a plain `axum`
//! router, matching the teacher's own preference for a real (if tiny)
//! server over a request-matching DSL.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Clone)]
struct Inner {
    pr_files: Vec<FakeFile>,
    author_login: String,
    author_is_bot: bool,
    /// GitLab's diff refs, echoed back by `GET .../merge_requests/{iid}`.
    diff_refs: (String, String, String),
    /// Every request this server accepted, in arrival order, for test
    /// assertions on what the publisher actually sent.
    submissions: Vec<Submission>,
    /// Counts down on each `create_review`-shaped call; while nonzero the
    /// server answers with a rejection, so callers can exercise the
    /// publisher's demote-and-retry-once path.
    reject_reviews_remaining: u32,
}

#[derive(Clone)]
struct FakeFile {
    filename: String,
    patch: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Submission {
    GitHubReview { event: String, body: String, comments: usize },
    GitLabNote { body: String },
    GitLabDiscussion { path: String, line: u32 },
}

/// A running fake forge instance. Dropping it does not stop the
/// background server task (the test process exiting does); each test
/// binds a fresh ephemeral port so this never collides across tests.
pub struct FakeForge {
    pub base_url: String,
    state: Arc<Mutex<Inner>>,
}

struct AppState(Arc<Mutex<Inner>>);

impl FakeForge {
    /// Starts the server with `author_login` as the PR/MR author and
    /// `files` as the changeset, binds an ephemeral localhost port, and
    /// returns once it is ready to accept connections.
    pub async fn spawn(author_login: &str, author_is_bot: bool, files: Vec<(String, Option<String>)>) -> Self {
        let state = Arc::new(Mutex::new(Inner {
            pr_files: files.into_iter().map(|(filename, patch)| FakeFile { filename, patch }).collect(),
            author_login: author_login.to_string(),
            author_is_bot,
            diff_refs: ("base-sha".to_string(), "start-sha".to_string(), "head-sha".to_string()),
            submissions: Vec::new(),
            reject_reviews_remaining: 0,
        }));

        let app = axum::Router::new()
            // GitHub's client interpolates `owner/repo` into the URL
            // unencoded, so (unlike the GitLab routes below) the path
            // can't be split into fixed segments ahead of time. One
            // wildcard route dispatches on method and re-parses the tail.
            .route("/repos/{*rest}", get(github_get).post(github_create_review))
            .route("/projects/{project}/merge_requests/{mr}/diffs", get(gitlab_diffs))
            .route("/projects/{project}/merge_requests/{mr}", get(gitlab_mr))
            .route("/projects/{project}/merge_requests/{mr}/notes", post(gitlab_note))
            .route("/projects/{project}/merge_requests/{mr}/discussions", post(gitlab_discussion))
            .with_state(Arc::new(AppState(state.clone())));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener has a local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url: format!("http://{addr}"), state }
    }

    /// Makes the next `reject_count` review-submission calls fail with a
    /// 422, simulating the "forge rejects REQUEST_CHANGES from the PR's
    /// own author" case the publisher's retry-once-demoted path handles.
    pub async fn reject_next_reviews(&self, reject_count: u32) {
        self.state.lock().await.reject_reviews_remaining = reject_count;
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.state.lock().await.submissions.clone()
    }
}

#[derive(Serialize)]
struct GhFileOut {
    filename: String,
    patch: Option<String>,
}

/// The trailing path shape after `/repos/{owner}/{repo}/pulls/{n}` for a
/// GET request: either nothing (the PR itself) or `/files`. `/reviews` is
/// POST-only and handled separately in `github_create_review`.
enum GhRoute {
    PullRequest,
    Files,
}

fn parse_github_rest(rest: &str) -> Option<GhRoute> {
    let (_owner_repo, tail) = rest.split_once("/pulls/")?;
    let mut segments = tail.split('/');
    let _pr_number = segments.next()?;
    match segments.next() {
        None => Some(GhRoute::PullRequest),
        Some("files") => Some(GhRoute::Files),
        _ => None,
    }
}

async fn github_get(State(state): State<Arc<AppState>>, Path(rest): Path<String>) -> impl IntoResponse {
    let inner = state.0.lock().await;
    match parse_github_rest(&rest) {
        Some(GhRoute::Files) => {
            let files: Vec<GhFileOut> = inner.pr_files.iter().map(|f| GhFileOut { filename: f.filename.clone(), patch: f.patch.clone() }).collect();
            (StatusCode::OK, Json(json!(files)))
        }
        Some(GhRoute::PullRequest) => {
            let kind = if inner.author_is_bot { "Bot" } else { "User" };
            (StatusCode::OK, Json(json!({ "user": { "login": inner.author_login, "type": kind } })))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no such route" }))),
    }
}

#[derive(Deserialize)]
struct GhReviewIn {
    event: String,
    body: String,
    comments: Vec<Value>,
}

async fn github_create_review(State(state): State<Arc<AppState>>, Path(rest): Path<String>, Json(body): Json<GhReviewIn>) -> impl IntoResponse {
    if !rest.ends_with("/reviews") {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "no such route" })));
    }
    let mut inner = state.0.lock().await;
    if inner.reject_reviews_remaining > 0 && body.event == "REQUEST_CHANGES" {
        inner.reject_reviews_remaining -= 1;
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "review event not permitted" })));
    }
    inner.submissions.push(Submission::GitHubReview { event: body.event, body: body.body, comments: body.comments.len() });
    (StatusCode::OK, Json(json!({})))
}

#[derive(Serialize)]
struct GlDiffOut {
    new_path: String,
    diff: String,
}

async fn gitlab_diffs(State(state): State<Arc<AppState>>, Path((_project, _mr)): Path<(String, u64)>) -> Json<Vec<GlDiffOut>> {
    let inner = state.0.lock().await;
    Json(
        inner
            .pr_files
            .iter()
            .filter_map(|f| f.patch.clone().map(|diff| GlDiffOut { new_path: f.filename.clone(), diff }))
            .collect(),
    )
}

async fn gitlab_mr(State(state): State<Arc<AppState>>, Path((_project, _mr)): Path<(String, u64)>) -> Json<Value> {
    let inner = state.0.lock().await;
    let (base_sha, start_sha, head_sha) = &inner.diff_refs;
    Json(json!({
        "author": { "username": inner.author_login },
        "diff_refs": { "base_sha": base_sha, "start_sha": start_sha, "head_sha": head_sha },
    }))
}

#[derive(Deserialize)]
struct GlNoteIn {
    body: String,
}

async fn gitlab_note(State(state): State<Arc<AppState>>, Path((_project, _mr)): Path<(String, u64)>, Json(body): Json<GlNoteIn>) -> impl IntoResponse {
    state.0.lock().await.submissions.push(Submission::GitLabNote { body: body.body });
    StatusCode::OK
}

#[derive(Deserialize)]
struct GlDiscussionPositionIn {
    new_path: String,
    new_line: u32,
}

#[derive(Deserialize)]
struct GlDiscussionIn {
    position: GlDiscussionPositionIn,
}

async fn gitlab_discussion(
    State(state): State<Arc<AppState>>,
    Path((_project, _mr)): Path<(String, u64)>,
    Json(body): Json<GlDiscussionIn>,
) -> impl IntoResponse {
    state
        .0
        .lock()
        .await
        .submissions
        .push(Submission::GitLabDiscussion { path: body.position.new_path, line: body.position.new_line });
    StatusCode::OK
}
