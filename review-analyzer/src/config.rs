//! The analyzer's config-file contract: `{aiProvider, openai?, claude?,
//! globalRules[], repository, pr, github?|gitlab?}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub ai_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude: Option<ProviderCredentials>,
    pub global_rules: Vec<String>,
    pub repository: RepositoryConfig,
    pub pr: PrConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<ForgeCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<ForgeCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeCredentials {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub full_name: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrConfig {
    pub number: u64,
    pub head_sha: String,
    pub base_branch: String,
}

const REDACTED: &str = "***redacted***";

impl AnalyzerConfig {
    /// Deep-clones the config and blanks every credential-bearing field
    /// before it is ever passed to `debug!`/`Debug` formatting. The real
    /// config is written to disk once and never touched again — there is
    /// no shallow, mutate-in-place redaction path for a caller to
    /// accidentally log the live secret through.
    pub fn redacted(&self) -> AnalyzerConfig {
        let mut copy = self.clone();
        if let Some(openai) = copy.openai.as_mut() {
            openai.api_key = REDACTED.to_string();
        }
        if let Some(claude) = copy.claude.as_mut() {
            claude.api_key = REDACTED.to_string();
        }
        if let Some(gh) = copy.github.as_mut() {
            gh.token = REDACTED.to_string();
        }
        if let Some(gl) = copy.gitlab.as_mut() {
            gl.token = REDACTED.to_string();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_does_not_touch_the_original() {
        let cfg = AnalyzerConfig {
            ai_provider: "openai".into(),
            openai: Some(ProviderCredentials { api_key: "sk-live-secret".into(), model: None }),
            claude: None,
            global_rules: vec![],
            repository: RepositoryConfig { full_name: "acme/widgets".into(), is_private: true },
            pr: PrConfig { number: 1, head_sha: "abc".into(), base_branch: "main".into() },
            github: Some(ForgeCredentials { token: "ghs_live".into() }),
            gitlab: None,
        };
        let redacted = cfg.redacted();
        assert_eq!(redacted.openai.unwrap().api_key, REDACTED);
        assert_eq!(redacted.github.unwrap().token, REDACTED);
        assert_eq!(cfg.openai.unwrap().api_key, "sk-live-secret");
    }
}
