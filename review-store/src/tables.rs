//! Typed shapes for the remaining §6 relational tables that the core
//! references but does not own: `usage_logs`, `github_installations`,
//! `users`, `sessions`, `code_symbols`. Their CRUD surfaces belong to the
//! HTTP/auth layer and the codebase-indexing path (both named out of
//! scope in spec.md §1); these types exist only so `review-store`'s
//! in-memory layout is a faithful, typed mirror of the full persisted
//! schema rather than silently dropping tables the core's neighbours
//! depend on.

use chrono::{DateTime, Utc};
use review_types::{OrgId, RepoId};
use serde::{Deserialize, Serialize};

/// One row per billing-relevant event; distinct from the Job Store's own
/// `count_since` so the core's admission meter does not depend on the
/// billing pipeline's write cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub org_id: OrgId,
    pub kind: String,
    pub quantity: u32,
    pub recorded_at: DateTime<Utc>,
}

/// GitHub App installation, linking an `Organization` to the app's
/// installation id used by `GetInstallationToken`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubInstallation {
    pub installation_id: i64,
    pub org_id: OrgId,
    pub account_login: String,
    pub suspended: bool,
}

/// Owned by the HTTP/session layer; referenced here only so `(org_id,
/// user_id)` joins used by the management API are representable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: uuid::Uuid,
    pub org_id: OrgId,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: uuid::Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Owned by the codebase-indexing path (`ENABLE_CODEBASE_INDEXING`);
/// the core's analyzer driver never reads this directly, it only forwards
/// `RUST_INDEXER_URL` to the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSymbol {
    pub repo_id: RepoId,
    pub path: String,
    pub symbol: String,
    pub kind: String,
}
