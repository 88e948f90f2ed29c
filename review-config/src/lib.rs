//! Typed configuration loaded from the process environment.
//!
//! Generalizes the teacher's `ai-llm-service/src/config/default_config.rs`
//! `env_opt_u32`-style parse-with-default pattern to the full §6 option
//! surface. Loaded once at startup into a `Config` held behind an `Arc`
//! inside the axum `AppState`.

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Claude,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub base_url: Option<String>,

    pub ai_provider: AiProvider,
    pub openai_api_key: Option<String>,
    pub claude_api_key: Option<String>,

    pub repos_path: String,
    pub max_repo_age_hours: u64,

    pub max_files_per_review: u32,
    pub max_concurrent_reviews: usize,
    pub review_timeout_ms: u64,

    pub review_cache_ttl_hours: u64,

    pub enable_incremental_reviews: bool,
    pub enable_codebase_indexing: bool,
    pub rust_indexer_url: Option<String>,

    /// Path/name of the pluggable external analyzer binary the Analyzer
    /// Driver spawns (spec.md §4.I). Defaults to a binary on `$PATH`
    /// rather than a repo-relative path, matching how the teacher's own
    /// subprocess tooling resolves the system `git` binary.
    pub analyzer_bin: String,

    pub github_webhook_secret: Option<String>,
    pub gitlab_webhook_secret: Option<String>,
    pub github_app_id: Option<String>,
    pub github_private_key_path: Option<String>,

    /// Not named in the webhook/management surface but required to
    /// authenticate outbound GitLab API calls the same way
    /// `github_app_id`/`github_private_key_path` authenticate GitHub
    /// ones; generalizes the teacher's `AppState::gitlab_token` field.
    pub gitlab_token: Option<String>,
    pub gitlab_api_base: Option<String>,
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_opt_u32(name: &'static str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(v) => v.parse().map_err(|e| ConfigError::Invalid {
            name,
            value: v,
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_opt_u64(name: &'static str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(v) => v.parse().map_err(|e| ConfigError::Invalid {
            name,
            value: v,
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_opt_bool(name: &'static str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                value: v,
                reason: "expected a boolean-like value".into(),
            }),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load the full §6 configuration surface. Returns `ConfigError` if a
    /// value that is set is malformed; genuinely optional values are
    /// allowed to be absent and fall back to their documented default.
    pub fn from_env() -> Result<Self> {
        let ai_provider = match env::var("AI_PROVIDER").as_deref() {
            Ok("claude") => AiProvider::Claude,
            Ok("openai") | Err(_) => AiProvider::OpenAi,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "AI_PROVIDER",
                    value: other.to_string(),
                    reason: "expected one of: openai, claude".into(),
                });
            }
        };

        Ok(Self {
            port: env_opt_u32("PORT", 3000)? as u16,
            database_url: env_opt("DATABASE_URL"),
            redis_url: env_opt("REDIS_URL"),
            base_url: env_opt("BASE_URL"),

            ai_provider,
            openai_api_key: env_opt("OPENAI_API_KEY"),
            claude_api_key: env_opt("CLAUDE_API_KEY"),

            repos_path: env_opt("REPOS_PATH").unwrap_or_else(|| "code_data/repos".to_string()),
            max_repo_age_hours: env_opt_u64("MAX_REPO_AGE_HOURS", 24)?,

            max_files_per_review: env_opt_u32("MAX_FILES_PER_REVIEW", 300)?,
            max_concurrent_reviews: env_opt_u32("MAX_CONCURRENT_REVIEWS", 5)? as usize,
            review_timeout_ms: env_opt_u64("REVIEW_TIMEOUT_MS", 10 * 60 * 1000)?,

            review_cache_ttl_hours: env_opt_u64("REVIEW_CACHE_TTL_HOURS", 24 * 14)?,

            enable_incremental_reviews: env_opt_bool("ENABLE_INCREMENTAL_REVIEWS", true)?,
            enable_codebase_indexing: env_opt_bool("ENABLE_CODEBASE_INDEXING", false)?,
            rust_indexer_url: env_opt("RUST_INDEXER_URL"),
            analyzer_bin: env_opt("ANALYZER_BIN").unwrap_or_else(|| "review-analyzer".to_string()),

            github_webhook_secret: env_opt("GITHUB_WEBHOOK_SECRET"),
            gitlab_webhook_secret: env_opt("GITLAB_WEBHOOK_SECRET"),
            github_app_id: env_opt("GITHUB_APP_ID"),
            github_private_key_path: env_opt("GITHUB_PRIVATE_KEY_PATH"),

            gitlab_token: env_opt("GITLAB_TOKEN"),
            gitlab_api_base: env_opt("GITLAB_API_BASE"),
        })
    }

    /// Convenience accessor for code paths that genuinely cannot proceed
    /// without a secret (e.g. the webhook verifier refusing to start
    /// unsigned).
    pub fn require_github_secret(&self) -> Result<&str> {
        self.github_webhook_secret
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_WEBHOOK_SECRET"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        unsafe { env::set_var("REVIEW_CONFIG_TEST_BOOL", "yes") };
        assert!(env_opt_bool("REVIEW_CONFIG_TEST_BOOL", false).unwrap());
        unsafe { env::set_var("REVIEW_CONFIG_TEST_BOOL", "0") };
        assert!(!env_opt_bool("REVIEW_CONFIG_TEST_BOOL", true).unwrap());
        unsafe { env::remove_var("REVIEW_CONFIG_TEST_BOOL") };
    }

    #[test]
    fn defaults_apply_when_unset() {
        unsafe { env::remove_var("MAX_CONCURRENT_REVIEWS") };
        assert_eq!(env_opt_u32("MAX_CONCURRENT_REVIEWS", 5).unwrap(), 5);
    }
}
