//! Ephemeral worktrees checked out from a pooled clone for the lifetime
//! of a single review.

use std::path::PathBuf;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::clone::RepoHandle;
use crate::errors::Result;
use crate::process::run_git;

/// A `git worktree add` checkout rooted at some commit. Dropping it
/// forces `git worktree remove --force` and deletes the directory —
/// nothing may reuse the path after the last `Worktree` referencing it
/// goes out of scope.
pub struct Worktree {
    pub path: PathBuf,
    repo_path: PathBuf,
}

#[instrument(skip(repo))]
pub async fn new_worktree(repo: &RepoHandle, sha: &str) -> Result<Worktree> {
    let worktree_path = repo.path.parent().unwrap_or(&repo.path).join(format!("wt-{}", Uuid::new_v4()));
    run_git(
        &["worktree", "add", "--force", worktree_path.to_string_lossy().as_ref(), sha],
        Some(&repo.path),
    )
    .await?;
    Ok(Worktree { path: worktree_path, repo_path: repo.path.clone() })
}

impl Drop for Worktree {
    fn drop(&mut self) {
        let path = self.path.clone();
        let repo_path = self.repo_path.clone();
        // Drop can't be async; best-effort blocking cleanup so a worker
        // that panics mid-review never leaks a checkout onto disk.
        let status = std::process::Command::new("git")
            .args(["worktree", "remove", "--force", path.to_string_lossy().as_ref()])
            .current_dir(&repo_path)
            .status();
        match status {
            Ok(s) if s.success() => {}
            _ => {
                warn!(path = %path.display(), "worktree remove failed, forcing directory removal");
                let _ = std::fs::remove_dir_all(&path);
            }
        }
    }
}
