//! Forge Publishing (spec.md §4.K / §6): the capability surface for
//! talking to a PR/MR host — `ListPRFiles`, `CreateReview`,
//! `GetPRAuthor`, `GetInstallationToken` — behind a single enum-dispatch
//! `ForgeClient`, one variant per supported platform. No `dyn Trait`,
//! no `async_trait`: callers match on `Platform` once at admission time
//! and carry the concrete client from there.

mod bitbucket;
mod errors;
mod github;
mod gitlab;
mod token;
mod types;

pub use bitbucket::BitbucketClient;
pub use errors::{ForgeError, Result};
pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use review_types::Platform;
pub use token::{InstallationTokenCache, mint_app_jwt};
pub use types::{InlineComment, PrAuthor, PrFile, ReviewEvent, ReviewSubmission, Side};

use reqwest::Client;

pub const GITHUB_DEFAULT_API: &str = "https://api.github.com";
pub const GITLAB_DEFAULT_API: &str = "https://gitlab.com/api/v4";

#[derive(Debug, Clone)]
pub enum ForgeClient {
    GitHub(GitHubClient),
    GitLab(GitLabClient),
    Bitbucket(BitbucketClient),
}

impl ForgeClient {
    pub fn github(http: Client, token: String) -> Self {
        Self::GitHub(GitHubClient::new(http, GITHUB_DEFAULT_API.to_string(), token))
    }

    pub fn gitlab(http: Client, base_api: Option<String>, token: String) -> Self {
        Self::GitLab(GitLabClient::new(http, base_api.unwrap_or_else(|| GITLAB_DEFAULT_API.to_string()), token))
    }

    pub fn bitbucket(http: Client, base_api: String, token: String) -> Self {
        Self::Bitbucket(BitbucketClient::new(http, base_api, token))
    }

    pub fn platform(&self) -> Platform {
        match self {
            Self::GitHub(_) => Platform::GitHub,
            Self::GitLab(_) => Platform::GitLab,
            Self::Bitbucket(_) => Platform::Bitbucket,
        }
    }

    /// `repo_ident` is `owner/name` for GitHub/Bitbucket, the
    /// URL-encodable project path or numeric ID for GitLab.
    pub async fn list_pr_files(&self, repo_ident: &str, pr_number: u64) -> Result<Vec<PrFile>> {
        match self {
            Self::GitHub(c) => c.list_pr_files(repo_ident, pr_number).await,
            Self::GitLab(c) => c.list_pr_files(repo_ident, pr_number).await,
            Self::Bitbucket(c) => c.list_pr_files(repo_ident, pr_number).await,
        }
    }

    pub async fn get_pr_author(&self, repo_ident: &str, pr_number: u64) -> Result<PrAuthor> {
        match self {
            Self::GitHub(c) => c.get_pr_author(repo_ident, pr_number).await,
            Self::GitLab(c) => c.get_pr_author(repo_ident, pr_number).await,
            Self::Bitbucket(c) => c.get_pr_author(repo_ident, pr_number).await,
        }
    }

    /// Single atomic submission per spec.md §4.K: body + event + every
    /// inline comment posted together, never a partial subset.
    pub async fn create_review(&self, repo_ident: &str, pr_number: u64, submission: &ReviewSubmission) -> Result<()> {
        match self {
            Self::GitHub(c) => c.create_review(repo_ident, pr_number, submission).await,
            Self::GitLab(c) => c.create_review(repo_ident, pr_number, submission).await,
            Self::Bitbucket(c) => c.create_review(repo_ident, pr_number, submission).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_matches_constructor() {
        let http = Client::new();
        assert_eq!(ForgeClient::github(http.clone(), "t".into()).platform(), Platform::GitHub);
        assert_eq!(ForgeClient::gitlab(http.clone(), None, "t".into()).platform(), Platform::GitLab);
        assert_eq!(ForgeClient::bitbucket(http, "https://api.bitbucket.org/2.0".into(), "t".into()).platform(), Platform::Bitbucket);
    }
}
