//! Review Cache (spec.md §4.H): content-addressed store of prior findings
//! keyed by chunk fingerprint, with TTL and prefix invalidation.
//!
//! The cache's central invariant (spec.md §8 "cache soundness"): for any
//! fingerprint `fp`, if `Get(fp) = Some(f)` then `f` equals the
//! analyzer's output for the chunk that produced `fp`, up to TTL. That
//! invariant is upheld by `review-diff`'s fingerprint formula hashing the
//! chunk's content, not merely its position.

pub mod key;

pub use key::CacheKey;

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use review_types::{Finding, RepoId};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("corrupted cache entry for key {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Clone)]
struct CacheEntry {
    findings: Vec<Finding>,
    expires_at: DateTime<Utc>,
}

/// `trait FindingCache`: `Get`, `Put`, `InvalidatePrefix`, `Stats`
/// exactly per spec.md §4.H. A Redis-backed implementation would satisfy
/// the same trait and key shape (see [`CacheKey`]); this one is an
/// in-process reference implementation suitable for the core's own
/// worker process and test suite.
pub trait FindingCache: Send + Sync {
    fn get(&self, repo_id: RepoId, file: &str, fingerprint: &review_diff::ChunkFingerprint) -> Result<Option<Vec<Finding>>>;
    fn put(
        &self,
        repo_id: RepoId,
        file: &str,
        fingerprint: &review_diff::ChunkFingerprint,
        findings: Vec<Finding>,
        ttl: Duration,
    ) -> Result<()>;
    /// Deletes all keys under `(repo_id, file?)`. Bounded batch size per
    /// scan so a large invalidation never blocks other callers for long.
    fn invalidate_prefix(&self, repo_id: RepoId, file: Option<&str>) -> Result<usize>;
    fn stats(&self, repo_id: RepoId) -> Result<usize>;
}

/// In-process implementation backed by a `DashMap` keyed by the rendered
/// `review:cache:...` string, matching §6's Redis key space.
pub struct InMemoryFindingCache {
    entries: DashMap<String, CacheEntry>,
    invalidate_batch_size: usize,
}

impl InMemoryFindingCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            invalidate_batch_size: 500,
        }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            invalidate_batch_size: batch_size,
        }
    }
}

impl Default for InMemoryFindingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FindingCache for InMemoryFindingCache {
    fn get(&self, repo_id: RepoId, file: &str, fingerprint: &review_diff::ChunkFingerprint) -> Result<Option<Vec<Finding>>> {
        let key = CacheKey::new(repo_id, file, fingerprint.clone()).to_string();
        match self.entries.get(&key) {
            None => Ok(None),
            Some(entry) => {
                if entry.expires_at <= Utc::now() {
                    drop(entry);
                    self.entries.remove(&key);
                    return Ok(None);
                }
                Ok(Some(entry.findings.clone()))
            }
        }
    }

    fn put(
        &self,
        repo_id: RepoId,
        file: &str,
        fingerprint: &review_diff::ChunkFingerprint,
        findings: Vec<Finding>,
        ttl: Duration,
    ) -> Result<()> {
        let key = CacheKey::new(repo_id, file, fingerprint.clone()).to_string();
        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(24));
        // Last-writer-wins: `insert` simply overwrites, no ordering assumed.
        self.entries.insert(key, CacheEntry { findings, expires_at });
        Ok(())
    }

    fn invalidate_prefix(&self, repo_id: RepoId, file: Option<&str>) -> Result<usize> {
        let prefix = CacheKey::prefix(repo_id, file);
        let victims: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(&prefix))
            .take(self.invalidate_batch_size)
            .map(|e| e.key().clone())
            .collect();
        let mut removed = 0;
        for key in victims {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn stats(&self, repo_id: RepoId) -> Result<usize> {
        let prefix = CacheKey::prefix(repo_id, None);
        Ok(self.entries.iter().filter(|e| e.key().starts_with(&prefix)).count())
    }
}

/// Helper for callers that want "treat any cache error as a blanket
/// miss" degrade-open behaviour (spec.md §7 `CacheUnavailable`).
pub fn get_or_miss(cache: &dyn FindingCache, repo_id: RepoId, file: &str, fingerprint: &review_diff::ChunkFingerprint) -> Option<Vec<Finding>> {
    match cache.get(repo_id, file, fingerprint) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "cache unavailable, degrading to miss");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_diff::ChunkFingerprint;
    use review_types::Severity;

    fn finding() -> Finding {
        Finding {
            file: "a.rs".into(),
            line: 10,
            severity: Severity::Warning,
            category: "style".into(),
            message: "msg".into(),
            fix: None,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = InMemoryFindingCache::new();
        let repo = RepoId::new();
        let fp = ChunkFingerprint("abc".into());
        cache.put(repo, "a.rs", &fp, vec![finding()], Duration::from_secs(60)).unwrap();
        let got = cache.get(repo, "a.rs", &fp).unwrap();
        assert_eq!(got.unwrap().len(), 1);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = InMemoryFindingCache::new();
        let repo = RepoId::new();
        let fp = ChunkFingerprint("abc".into());
        cache.put(repo, "a.rs", &fp, vec![finding()], Duration::from_secs(0)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(repo, "a.rs", &fp).unwrap().is_none());
    }

    #[test]
    fn invalidate_prefix_scopes_to_file_when_given() {
        let cache = InMemoryFindingCache::new();
        let repo = RepoId::new();
        let fp1 = ChunkFingerprint("f1".into());
        let fp2 = ChunkFingerprint("f2".into());
        cache.put(repo, "a.rs", &fp1, vec![finding()], Duration::from_secs(60)).unwrap();
        cache.put(repo, "b.rs", &fp2, vec![finding()], Duration::from_secs(60)).unwrap();
        let removed = cache.invalidate_prefix(repo, Some("a.rs")).unwrap();
        assert_eq!(removed, 1);
        assert!(cache.get(repo, "a.rs", &fp1).unwrap().is_none());
        assert!(cache.get(repo, "b.rs", &fp2).unwrap().is_some());
    }

    #[test]
    fn different_fingerprints_are_independent_keys() {
        let cache = InMemoryFindingCache::new();
        let repo = RepoId::new();
        let fp1 = ChunkFingerprint("f1".into());
        let fp2 = ChunkFingerprint("f2".into());
        cache.put(repo, "a.rs", &fp1, vec![finding()], Duration::from_secs(60)).unwrap();
        assert!(cache.get(repo, "a.rs", &fp2).unwrap().is_none());
    }
}
