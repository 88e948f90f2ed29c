use std::collections::HashMap;

use review_types::{OrgId, Platform, RepoId, Repository};
use tokio::sync::RwLock;

use crate::errors::Result;

/// In-memory `repositories` table. Invariant: `(org_id, platform,
/// external_id)` unique — enforced here via `identity_key`, which also
/// resolves the concurrent-creation race spec.md §9 calls out ("two
/// parallel webhook events for the same PR can race at Repository
/// creation. The source tolerates the race by re-reading; a clean design
/// is a unique index plus upsert") by making `upsert` the only write
/// path: a second caller racing on the same identity gets the row the
/// first caller inserted instead of erroring.
#[derive(Default)]
pub struct RepositoryStore {
    by_id: RwLock<HashMap<RepoId, Repository>>,
    by_identity: RwLock<HashMap<String, RepoId>>,
    /// `(platform, external_id) -> RepoId`, independent of `org_id`.
    /// Event Intake's `issue_comment`/`note` command-invocation path only
    /// ever carries the forge-native repo identity, not the org slug, so
    /// it needs to resolve a repo without knowing its org ahead of time.
    by_platform_external: RwLock<HashMap<(Platform, String), RepoId>>,
}

impl RepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert-by-identity: returns the existing row if one already
    /// matches `(org_id, platform, external_id)`, otherwise inserts
    /// `make()` and returns it.
    pub async fn upsert(
        &self,
        org_id: OrgId,
        platform: Platform,
        external_id: &str,
        make: impl FnOnce() -> Repository,
    ) -> Repository {
        let key = Repository::identity_key(org_id, platform, external_id);
        {
            let by_identity = self.by_identity.read().await;
            if let Some(id) = by_identity.get(&key) {
                let by_id = self.by_id.read().await;
                if let Some(repo) = by_id.get(id) {
                    return repo.clone();
                }
            }
        }
        let mut by_identity = self.by_identity.write().await;
        if let Some(id) = by_identity.get(&key) {
            // Lost the race between the read above and taking the write
            // lock; another caller already inserted it.
            return self.by_id.read().await.get(id).cloned().expect("identity index points at live row");
        }
        let repo = make();
        by_identity.insert(key, repo.id);
        self.by_platform_external
            .write()
            .await
            .insert((repo.platform, repo.external_id.clone()), repo.id);
        self.by_id.write().await.insert(repo.id, repo.clone());
        repo
    }

    pub async fn get(&self, id: RepoId) -> Result<Option<Repository>> {
        Ok(self.by_id.read().await.get(&id).cloned())
    }

    /// Resolves a repo by forge identity alone, without an `org_id` —
    /// what a command-invocation webhook (a comment on an existing PR)
    /// has to work with.
    pub async fn find_by_external_id(&self, platform: Platform, external_id: &str) -> Result<Option<Repository>> {
        let Some(id) = self
            .by_platform_external
            .read()
            .await
            .get(&(platform, external_id.to_string()))
            .copied()
        else {
            return Ok(None);
        };
        Ok(self.by_id.read().await.get(&id).cloned())
    }

    pub async fn set_active(&self, id: RepoId, active: bool) -> Result<()> {
        if let Some(repo) = self.by_id.write().await.get_mut(&id) {
            repo.is_active = active;
        }
        Ok(())
    }

    pub async fn count_for_org(&self, org_id: OrgId) -> u64 {
        self.by_id.read().await.values().filter(|r| r.org_id == org_id).count() as u64
    }
}
