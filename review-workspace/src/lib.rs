//! Workspace Manager: pooled, shared git clones and ephemeral worktrees
//! for running a review against a specific commit.
//!
//! `git2` (libgit2) has no partial-clone or sparse-checkout support, so
//! the clone and worktree lifecycle below shells out to the system
//! `git` binary via `tokio::process::Command` — the same "spawn
//! subprocess, parse output" posture the rest of this pack's tooling
//! already uses where an in-process library falls short. Plumbing reads
//! once a checkout exists (diff, changed files) go back through plain
//! `git` subprocess calls too, for consistency with the same credential
//! and timeout handling.

mod clone;
mod diff;
mod errors;
mod process;
mod worktree;

pub use clone::RepoHandle;
pub use errors::{Result, WorkspaceError};
pub use worktree::Worktree;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, instrument};

struct PoolEntry {
    handle: RepoHandle,
    last_used: DateTime<Utc>,
}

pub struct Workspace {
    repos_path: PathBuf,
    max_repo_age: chrono::Duration,
    pool: Mutex<HashMap<String, PoolEntry>>,
}

impl Workspace {
    pub fn new(repos_path: PathBuf, max_repo_age_hours: u64) -> Self {
        Self {
            repos_path,
            max_repo_age: chrono::Duration::hours(max_repo_age_hours as i64),
            pool: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pooled clone for `clone_url`, cloning it if this is
    /// the first time it's been requested (or if its on-disk directory
    /// has gone missing out from under the pool, e.g. after a manual
    /// cleanup).
    #[instrument(skip(self))]
    pub async fn clone_or_reuse(&self, clone_url: &str) -> Result<RepoHandle> {
        let mut pool = self.pool.lock().await;
        if let Some(entry) = pool.get_mut(clone_url) {
            if entry.handle.path.exists() {
                entry.last_used = Utc::now();
                clone::fetch(&entry.handle).await?;
                return Ok(entry.handle.clone());
            }
        }
        let handle = clone::clone_repo(clone_url, &self.repos_path).await?;
        pool.insert(clone_url.to_string(), PoolEntry { handle: handle.clone(), last_used: Utc::now() });
        Ok(handle)
    }

    pub async fn new_worktree(&self, repo: &RepoHandle, sha: &str) -> Result<Worktree> {
        worktree::new_worktree(repo, sha).await
    }

    pub async fn diff(&self, repo_path: &std::path::Path, base: &str, head: &str) -> Result<String> {
        diff::diff(repo_path, base, head).await
    }

    pub async fn changed_files(&self, repo_path: &std::path::Path, base: &str, head: &str) -> Result<Vec<String>> {
        diff::changed_files(repo_path, base, head).await
    }

    /// Deletes pooled clones untouched for longer than `max_repo_age`.
    /// Intended to be driven by `spawn_sweeper` on an interval.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> usize {
        let cutoff = Utc::now() - self.max_repo_age;
        let mut pool = self.pool.lock().await;
        let expired: Vec<String> = pool.iter().filter(|(_, e)| e.last_used < cutoff).map(|(k, _)| k.clone()).collect();
        let mut removed = 0;
        for key in expired {
            if let Some(entry) = pool.remove(&key) {
                if let Err(e) = tokio::fs::remove_dir_all(&entry.handle.path).await {
                    tracing::warn!(path = %entry.handle.path.display(), error = %e, "failed to remove expired clone");
                } else {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(removed, "swept expired clones");
        }
        removed
    }
}

/// Spawns the background sweeper loop. Drop the returned `JoinHandle`
/// (or abort it) to stop sweeping; the task otherwise runs for the
/// lifetime of the process.
pub fn spawn_sweeper(workspace: Arc<Workspace>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            workspace.sweep_expired().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_removes_nothing_when_empty() {
        let ws = Workspace::new(std::env::temp_dir().join("review-workspace-test-empty"), 24);
        assert_eq!(ws.sweep_expired().await, 0);
    }
}
