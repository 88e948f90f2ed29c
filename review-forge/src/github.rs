//! GitHub forge client: the concrete implementation of the three
//! capability methods spec.md §6 names, plus `GetInstallationToken`.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{PrAuthor, PrFile, ReviewSubmission};

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
    token: String,
}

#[derive(Deserialize)]
struct GhFile {
    filename: String,
    patch: Option<String>,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct GhPullRequest {
    user: GhUser,
}

#[derive(Serialize)]
struct GhReviewComment<'a> {
    path: &'a str,
    line: u32,
    body: &'a str,
    side: &'a str,
}

#[derive(Serialize)]
struct GhCreateReview<'a> {
    commit_id: &'a str,
    body: &'a str,
    event: &'a str,
    comments: Vec<GhReviewComment<'a>>,
}

impl GitHubClient {
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self { http, base_api, token }
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "review-core/0.1")
    }

    pub async fn list_pr_files(&self, owner_repo: &str, pr_number: u64) -> Result<Vec<PrFile>> {
        let url = format!("{}/repos/{owner_repo}/pulls/{pr_number}/files", self.base_api);
        let files: Vec<GhFile> = self
            .auth(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(files
            .into_iter()
            .map(|f| PrFile { filename: f.filename, patch: f.patch })
            .collect())
    }

    pub async fn get_pr_author(&self, owner_repo: &str, pr_number: u64) -> Result<PrAuthor> {
        let url = format!("{}/repos/{owner_repo}/pulls/{pr_number}", self.base_api);
        let pr: GhPullRequest = self
            .auth(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let is_bot = pr.user.kind == "Bot" || pr.user.login.ends_with("[bot]");
        Ok(PrAuthor { login: pr.user.login, is_bot })
    }

    /// One `POST .../reviews` call carrying body + event + every inline
    /// comment together — GitHub's native atomic review submission API.
    pub async fn create_review(&self, owner_repo: &str, pr_number: u64, submission: &ReviewSubmission) -> Result<()> {
        let url = format!("{}/repos/{owner_repo}/pulls/{pr_number}/reviews", self.base_api);
        let event = match submission.event {
            crate::types::ReviewEvent::Approve => "APPROVE",
            crate::types::ReviewEvent::Comment => "COMMENT",
            crate::types::ReviewEvent::RequestChanges => "REQUEST_CHANGES",
        };
        let body = GhCreateReview {
            commit_id: &submission.commit_id,
            body: &submission.body,
            event,
            comments: submission
                .comments
                .iter()
                .map(|c| GhReviewComment { path: &c.path, line: c.line, body: &c.body, side: "RIGHT" })
                .collect(),
        };
        self.auth(self.http.post(url)).json(&body).send().await?.error_for_status()?;
        Ok(())
    }
}
