//! Raw diff text and changed-file listing between two refs.
//!
//! Unlike cloning and worktree setup, diffing is plain plumbing that
//! `git2` handles natively, so these reads go through libgit2 directly
//! rather than shelling out — mirroring the teacher's own split between
//! subprocess tooling for the things libgit2 can't do and in-process
//! calls for the things it can.

use std::path::Path;

use git2::{DiffFormat, DiffOptions, Repository};
use tracing::instrument;

use crate::errors::Result;

#[instrument(skip(repo_path))]
pub async fn diff(repo_path: &Path, base: &str, head: &str) -> Result<String> {
    let repo_path = repo_path.to_path_buf();
    let base = base.to_string();
    let head = head.to_string();
    tokio::task::spawn_blocking(move || diff_blocking(&repo_path, &base, &head)).await?
}

#[instrument(skip(repo_path))]
pub async fn changed_files(repo_path: &Path, base: &str, head: &str) -> Result<Vec<String>> {
    let repo_path = repo_path.to_path_buf();
    let base = base.to_string();
    let head = head.to_string();
    tokio::task::spawn_blocking(move || changed_files_blocking(&repo_path, &base, &head)).await?
}

fn diff_blocking(repo_path: &Path, base: &str, head: &str) -> Result<String> {
    let repo = Repository::open(repo_path)?;
    let base_tree = repo.revparse_single(base)?.peel_to_tree()?;
    let head_tree = repo.revparse_single(head)?.peel_to_tree()?;
    let mut opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))?;

    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_, _, line| {
        if !matches!(line.origin(), '+' | '-' | ' ') {
            out.push(line.origin());
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

fn changed_files_blocking(repo_path: &Path, base: &str, head: &str) -> Result<Vec<String>> {
    let repo = Repository::open(repo_path)?;
    let base_tree = repo.revparse_single(base)?.peel_to_tree()?;
    let head_tree = repo.revparse_single(head)?.peel_to_tree()?;
    let mut opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))?;

    let mut files = Vec::new();
    for delta in diff.deltas() {
        if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
            files.push(path.to_string_lossy().into_owned());
        }
    }
    Ok(files)
}
