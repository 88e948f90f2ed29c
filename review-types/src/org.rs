use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrgId, Plan};

/// Tenant root. Invariant: `slug` is unique across the table. Created on
/// first forge installation or manual signup; never deleted while any
/// `Repository` still references it (see `Repository::org_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub slug: String,
    pub plan: Plan,
    pub plan_activated_at: DateTime<Utc>,
    /// Weak back-reference, resolved by lookup; neither side owns the
    /// other (see spec.md §9 "Cross-component references without cycles").
    pub installation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(slug: impl Into<String>, plan: Plan) -> Self {
        let now = Utc::now();
        Self {
            id: OrgId::new(),
            slug: slug.into(),
            plan,
            plan_activated_at: now,
            installation_id: None,
            created_at: now,
        }
    }
}
