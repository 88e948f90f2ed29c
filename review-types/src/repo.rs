use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{OrgId, Platform, RepoId};

/// A `(platform, external_id)` within an organization. Invariant:
/// `(org_id, platform, external_id)` unique. Created on first PR event
/// from a forge; `is_active` gates admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    pub org_id: OrgId,
    pub platform: Platform,
    /// Forge-native identifier, e.g. GitHub numeric repo id or
    /// GitLab "group/project" path.
    pub external_id: String,
    pub full_name: String,
    pub is_private: bool,
    pub is_active: bool,
    pub config: Value,
    pub created_at: DateTime<Utc>,
}

impl Repository {
    pub fn new(
        org_id: OrgId,
        platform: Platform,
        external_id: impl Into<String>,
        full_name: impl Into<String>,
        is_private: bool,
    ) -> Self {
        Self {
            id: RepoId::new(),
            org_id,
            platform,
            external_id: external_id.into(),
            full_name: full_name.into(),
            is_private,
            is_active: true,
            config: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    /// Key used by the Job Store's unique-index emulation and by
    /// `upsert_repository` to resolve the concurrent-creation race noted
    /// in spec.md §9 ("two parallel webhook events ... race at Repository
    /// creation").
    pub fn identity_key(org_id: OrgId, platform: Platform, external_id: &str) -> String {
        format!("{org_id}:{}:{external_id}", platform.as_str())
    }
}
