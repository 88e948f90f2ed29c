use std::fmt;

use review_diff::ChunkFingerprint;
use review_types::RepoId;

/// Key shape mirrors spec.md §6's Redis key space
/// `review:cache:{repo_id}:{file_path}:{chunk_fingerprint}` exactly, even
/// though the shipped implementation is an in-process map — the
/// `Display` impl renders that literal string, so a Redis-backed
/// `FindingCache` is a drop-in swap that only needs to use this as its
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub repo_id: RepoId,
    pub file: String,
    pub fingerprint: ChunkFingerprint,
}

impl CacheKey {
    pub fn new(repo_id: RepoId, file: impl Into<String>, fingerprint: ChunkFingerprint) -> Self {
        Self {
            repo_id,
            file: file.into(),
            fingerprint,
        }
    }

    /// Prefix used by `InvalidatePrefix(repo_id, file?)`: either
    /// `review:cache:{repo_id}:` (whole repo) or
    /// `review:cache:{repo_id}:{file}:` (one file).
    pub fn prefix(repo_id: RepoId, file: Option<&str>) -> String {
        match file {
            Some(f) => format!("review:cache:{repo_id}:{f}:"),
            None => format!("review:cache:{repo_id}:"),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "review:cache:{}:{}:{}", self.repo_id, self.file, self.fingerprint)
    }
}
