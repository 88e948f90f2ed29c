//! Analyzer Driver: subprocess invocation of the pluggable external
//! analyzer, with a scoped credential-bearing config file and strict
//! stdout parsing.

pub mod config;
pub mod errors;
pub mod output;
mod scoped_config;

pub use config::{AnalyzerConfig, ForgeCredentials, PrConfig, ProviderCredentials, RepositoryConfig};
pub use errors::{AnalyzerError, Result};
pub use output::{AnalyzerOutput, AnalyzerStats, RawFinding};
pub use scoped_config::{ScopedConfigFile, write_scoped_config};

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tracing::{debug, error, instrument, warn};

const STDERR_TAIL_LINES: usize = 40;

/// How long the analyzer gets to exit on its own after `SIGTERM` before
/// the driver escalates to `SIGKILL` (spec.md §5: "on fire, the worker
/// cancels the subprocess (SIGTERM then SIGKILL after grace)").
const SIGTERM_GRACE: Duration = Duration::from_secs(5);

/// Spawns `<analyzer_bin> <config_path> <worktree> <head_branch>
/// <base_branch>`, `stdin = /dev/null`, captures stdout/stderr, and
/// enforces `timeout`. The config file is written by the caller (via
/// `write_scoped_config`) and its `ScopedConfigFile` guard should be
/// held until after this call returns so the file exists for the whole
/// subprocess lifetime and is deleted immediately after, win or lose.
#[instrument(skip(analyzer_bin), fields(worktree = %worktree.display()))]
pub async fn run_analyzer(
    analyzer_bin: &str,
    config_path: &Path,
    worktree: &Path,
    head_branch: &str,
    base_branch: &str,
    timeout: Duration,
) -> Result<AnalyzerOutput> {
    let mut cmd = tokio::process::Command::new(analyzer_bin);
    cmd.arg(config_path)
        .arg(worktree)
        .arg(head_branch)
        .arg(base_branch)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Backstop only: if this future is ever dropped while the child
        // is still alive (task panic, process abort), tokio force-kills
        // it rather than leaking it. The graceful SIGTERM-then-SIGKILL
        // path below is the normal way a timeout is handled and runs
        // well before this would ever need to fire.
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(AnalyzerError::Spawn)?;
    let pid = child.id();
    let mut stdout_pipe = child.stdout.take().expect("stdout piped");
    let mut stderr_pipe = child.stderr.take().expect("stderr piped");

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    // `select!` (rather than a named future raced under `timeout`) is
    // what lets the timeout branch reclaim `child` afterward: it drops
    // the losing branch's future — releasing its borrow of `child` — the
    // moment the other branch completes, before that arm's body runs.
    let status = tokio::select! {
        result = async {
            let (_, _, status) = tokio::try_join!(
                stdout_pipe.read_to_end(&mut stdout_buf),
                stderr_pipe.read_to_end(&mut stderr_buf),
                child.wait(),
            )?;
            Ok::<_, std::io::Error>(status)
        } => result?,
        _ = tokio::time::sleep(timeout) => {
            error!(?timeout, "analyzer subprocess exceeded timeout, sending SIGTERM");
            if let Some(pid) = pid {
                // SAFETY: `pid` was just obtained from this process's own
                // `Child` handle via `Child::id`, identifying a process we
                // spawned and still own; tokio's `Child` exposes no
                // SIGTERM helper (only `start_kill`'s SIGKILL), so sending
                // the signal directly is the only way to ask it to exit
                // gracefully first.
                #[cfg(unix)]
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGTERM);
                }
                #[cfg(not(unix))]
                let _ = pid;
            }
            if tokio::time::timeout(SIGTERM_GRACE, child.wait()).await.is_err() {
                warn!("analyzer ignored SIGTERM within grace period, sending SIGKILL");
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
            return Err(AnalyzerError::Timeout(timeout));
        }
    };

    let stderr = String::from_utf8_lossy(&stderr_buf);
    if !status.success() {
        let tail = stderr_tail(&stderr, STDERR_TAIL_LINES);
        warn!(status = %status, stderr_tail = %tail, "analyzer exited non-zero");
        return Err(AnalyzerError::ExecError { status: status.to_string(), stderr_tail: tail });
    }
    if !stderr.trim().is_empty() {
        debug!(stderr = %stderr_tail(&stderr, STDERR_TAIL_LINES), "analyzer stderr (diagnostic, non-fatal)");
    }

    let stdout = String::from_utf8_lossy(&stdout_buf);
    output::extract_json(&stdout)
}

fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
