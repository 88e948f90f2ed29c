//! GitLab forge client.
//!
//! GitLab's REST API has no single bundled "submit review" endpoint like
//! GitHub's `POST .../reviews`: inline findings go through the
//! Discussions API (one POST per position) and the overall verdict
//! through the Notes API. `create_review` below issues that sequence
//! under one semaphore-free async block so the publisher still sees one
//! logical `create_review` call; spec.md §4.K's "partial posting is
//! forbidden" is therefore a best-effort property here rather than a
//! single-HTTP-call guarantee, since the forge itself doesn't offer one.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{PrAuthor, PrFile, ReviewSubmission};

#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_api: String,
    token: String,
}

#[derive(Deserialize)]
struct GlDiff {
    new_path: String,
    diff: String,
}

#[derive(Deserialize)]
struct GlAuthor {
    username: String,
}

#[derive(Deserialize)]
struct GlMergeRequest {
    author: GlAuthor,
    diff_refs: GlDiffRefs,
}

#[derive(Deserialize)]
struct GlDiffRefs {
    base_sha: String,
    start_sha: String,
    head_sha: String,
}

#[derive(Serialize)]
struct GlNote<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct GlDiscussionPosition<'a> {
    base_sha: &'a str,
    start_sha: &'a str,
    head_sha: &'a str,
    position_type: &'static str,
    new_path: &'a str,
    new_line: u32,
}

#[derive(Serialize)]
struct GlDiscussion<'a> {
    body: &'a str,
    position: GlDiscussionPosition<'a>,
}

impl GitLabClient {
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self { http, base_api, token }
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("PRIVATE-TOKEN", &self.token)
    }

    pub async fn list_pr_files(&self, project: &str, mr_iid: u64) -> Result<Vec<PrFile>> {
        let url = format!(
            "{}/projects/{}/merge_requests/{mr_iid}/diffs",
            self.base_api,
            urlencoding::encode(project)
        );
        let diffs: Vec<GlDiff> = self.auth(self.http.get(url)).send().await?.error_for_status()?.json().await?;
        Ok(diffs.into_iter().map(|d| PrFile { filename: d.new_path, patch: Some(d.diff) }).collect())
    }

    pub async fn get_pr_author(&self, project: &str, mr_iid: u64) -> Result<PrAuthor> {
        let mr = self.get_mr(project, mr_iid).await?;
        let is_bot = mr.author.username.ends_with("-bot") || mr.author.username.contains("bot");
        Ok(PrAuthor { login: mr.author.username, is_bot })
    }

    async fn get_mr(&self, project: &str, mr_iid: u64) -> Result<GlMergeRequest> {
        let url = format!(
            "{}/projects/{}/merge_requests/{mr_iid}",
            self.base_api,
            urlencoding::encode(project)
        );
        Ok(self.auth(self.http.get(url)).send().await?.error_for_status()?.json().await?)
    }

    pub async fn create_review(&self, project: &str, mr_iid: u64, submission: &ReviewSubmission) -> Result<()> {
        let refs = self.get_mr(project, mr_iid).await?.diff_refs;

        let notes_url = format!(
            "{}/projects/{}/merge_requests/{mr_iid}/notes",
            self.base_api,
            urlencoding::encode(project)
        );
        self.auth(self.http.post(&notes_url))
            .json(&GlNote { body: &submission.body })
            .send()
            .await?
            .error_for_status()?;

        let disc_url = format!(
            "{}/projects/{}/merge_requests/{mr_iid}/discussions",
            self.base_api,
            urlencoding::encode(project)
        );
        for comment in &submission.comments {
            let position = GlDiscussionPosition {
                base_sha: &refs.base_sha,
                start_sha: &refs.start_sha,
                head_sha: &refs.head_sha,
                position_type: "text",
                new_path: &comment.path,
                new_line: comment.line,
            };
            self.auth(self.http.post(&disc_url))
                .json(&GlDiscussion { body: &comment.body, position })
                .send()
                .await?
                .error_for_status()?;
        }
        Ok(())
    }
}
