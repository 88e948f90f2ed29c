use std::collections::HashMap;

use review_types::{OrgId, Organization};
use tokio::sync::RwLock;

use crate::errors::{Result, StoreError};

/// In-memory `organizations` table. Invariant: `slug` is unique.
#[derive(Default)]
pub struct OrganizationStore {
    by_id: RwLock<HashMap<OrgId, Organization>>,
    by_slug: RwLock<HashMap<String, OrgId>>,
}

impl OrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, org: Organization) -> Result<OrgId> {
        let mut by_slug = self.by_slug.write().await;
        if by_slug.contains_key(&org.slug) {
            return Err(StoreError::UniqueViolation(format!("slug {} already exists", org.slug)));
        }
        let id = org.id;
        by_slug.insert(org.slug.clone(), id);
        self.by_id.write().await.insert(id, org);
        Ok(id)
    }

    pub async fn get(&self, id: OrgId) -> Option<Organization> {
        self.by_id.read().await.get(&id).cloned()
    }

    pub async fn get_by_slug(&self, slug: &str) -> Option<Organization> {
        let id = *self.by_slug.read().await.get(slug)?;
        self.get(id).await
    }

    /// Returns the existing organization for `slug`, creating it with the
    /// given default plan if absent. Organizations are never deleted
    /// while repositories reference them (spec.md §3 lifecycle), so this
    /// is the only mutation path besides plan changes.
    pub async fn get_or_create(&self, slug: &str, default: impl FnOnce() -> Organization) -> Organization {
        if let Some(existing) = self.get_by_slug(slug).await {
            return existing;
        }
        let org = default();
        // Race: two concurrent webhook deliveries can both miss the read
        // above and both attempt to create the same slug. Re-read on
        // conflict rather than erroring the caller.
        match self.create(org.clone()).await {
            Ok(_) => org,
            Err(StoreError::UniqueViolation(_)) => self
                .get_by_slug(slug)
                .await
                .expect("slug must exist after UniqueViolation"),
            Err(e) => panic!("unexpected organization store error: {e}"),
        }
    }
}
