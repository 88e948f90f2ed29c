//! Bitbucket Cloud forge client skeleton (TODO).
//!
//! Endpoints to implement next:
//! - GET  /2.0/repositories/{workspace}/{repo_slug}/pullrequests/{id}/diff
//! - POST /2.0/.../pullrequests/{id}/comments
//! - POST /2.0/.../pullrequests/{id}/approve

use reqwest::Client;

use crate::errors::{ForgeError, Result};
use crate::types::{PrAuthor, PrFile, ReviewSubmission};

#[derive(Debug, Clone)]
pub struct BitbucketClient {
    #[allow(dead_code)]
    http: Client,
    #[allow(dead_code)]
    base_api: String,
    #[allow(dead_code)]
    token: String,
}

impl BitbucketClient {
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self { http, base_api, token }
    }

    pub async fn list_pr_files(&self, _repo: &str, _pr_id: u64) -> Result<Vec<PrFile>> {
        Err(ForgeError::Permanent("bitbucket support not implemented".into()))
    }

    pub async fn get_pr_author(&self, _repo: &str, _pr_id: u64) -> Result<PrAuthor> {
        Err(ForgeError::Permanent("bitbucket support not implemented".into()))
    }

    pub async fn create_review(&self, _repo: &str, _pr_id: u64, _submission: &ReviewSubmission) -> Result<()> {
        Err(ForgeError::Permanent("bitbucket support not implemented".into()))
    }
}
