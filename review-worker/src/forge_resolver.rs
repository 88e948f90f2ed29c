//! Resolves the concrete `ForgeClient` for a job: GitHub goes through the
//! installation-token single-flight cache, GitLab through a static PAT,
//! Bitbucket has no credential source configured yet and is rejected at
//! resolve time rather than later inside a forge call.

use std::sync::Arc;

use reqwest::Client;
use review_forge::{ForgeClient, InstallationTokenCache};
use review_types::Platform;

use crate::errors::PipelineError;

pub struct ForgeResolver {
    http: Client,
    github_tokens: Option<Arc<InstallationTokenCache>>,
    gitlab_token: Option<String>,
    gitlab_api_base: Option<String>,
}

impl ForgeResolver {
    pub fn new(
        http: Client,
        github_tokens: Option<Arc<InstallationTokenCache>>,
        gitlab_token: Option<String>,
        gitlab_api_base: Option<String>,
    ) -> Self {
        Self { http, github_tokens, gitlab_token, gitlab_api_base }
    }

    pub async fn resolve(&self, platform: Platform, installation_id: Option<i64>) -> Result<ForgeClient, PipelineError> {
        match platform {
            Platform::GitHub => {
                let cache = self.github_tokens.as_ref().ok_or(PipelineError::MissingCredentials(platform))?;
                let installation_id = installation_id.ok_or(PipelineError::MissingCredentials(platform))?;
                let token = cache.get(installation_id).await?;
                Ok(ForgeClient::github(self.http.clone(), token.token))
            }
            Platform::GitLab => {
                let token = self.gitlab_token.clone().ok_or(PipelineError::MissingCredentials(platform))?;
                Ok(ForgeClient::gitlab(self.http.clone(), self.gitlab_api_base.clone(), token))
            }
            Platform::Bitbucket => Err(PipelineError::MissingCredentials(platform)),
        }
    }
}
