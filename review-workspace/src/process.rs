//! Shared subprocess plumbing: every git invocation that needs
//! partial-clone/sparse-checkout/worktree support (none of which `git2`
//! exposes) goes through `run_git`, reusing the teacher's
//! `SSH_KEY_PATH`/`GIT_HTTP_TOKEN`/`GIT_HTTP_USER` credential
//! convention, just applied to a subprocess environment instead of
//! libgit2 credential callbacks.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{Result, WorkspaceError};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub(crate) async fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    run_git_timeout(args, cwd, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
}

pub(crate) async fn run_git_timeout(args: &[&str], cwd: Option<&Path>, timeout: Duration) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    apply_credentials(&mut cmd);

    debug!(?args, cwd = ?cwd, "running git subprocess");
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(inner) => inner?,
        Err(_) => return Err(WorkspaceError::Timeout(timeout)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(?args, status = %output.status, stderr = %stderr, "git subprocess failed");
        return Err(WorkspaceError::ProcessFailed { status: output.status.to_string(), stderr });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Applies the same credential convention `project_code_store` used for
/// libgit2 callbacks, here as subprocess environment: an SSH key path
/// becomes `GIT_SSH_COMMAND`, an HTTP token is consumed by the caller
/// when building the clone URL (see `clone::authenticated_url`).
fn apply_credentials(cmd: &mut Command) {
    if let Ok(key_path) = std::env::var("SSH_KEY_PATH") {
        cmd.env("GIT_SSH_COMMAND", format!("ssh -i {key_path} -o StrictHostKeyChecking=accept-new"));
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");
}
