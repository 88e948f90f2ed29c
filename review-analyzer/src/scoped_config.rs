//! Scoped, 0600 config file passed to the analyzer as argv — never env,
//! so it never leaks into process listings or child environments beyond
//! this one.

use std::path::PathBuf;

use tracing::warn;
use uuid::Uuid;

use crate::config::AnalyzerConfig;
use crate::errors::Result;

/// Deletes its backing file when dropped, on every exit path: success,
/// early return, or panic unwind — the same cleanup-guarantee shape as
/// the workspace manager's worktree guard.
pub struct ScopedConfigFile {
    pub path: PathBuf,
}

impl Drop for ScopedConfigFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove scoped analyzer config");
            }
        }
    }
}

pub async fn write_scoped_config(dir: &std::path::Path, config: &AnalyzerConfig) -> Result<ScopedConfigFile> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("analyzer-config-{}.json", Uuid::new_v4()));
    let body = serde_json::to_vec(config).map_err(|e| crate::errors::AnalyzerError::ProtocolError(e.to_string()))?;

    write_with_owner_only_perms(&path, &body).await?;
    Ok(ScopedConfigFile { path })
}

#[cfg(unix)]
async fn write_with_owner_only_perms(path: &std::path::Path, body: &[u8]) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    use tokio::fs::OpenOptions;
    use tokio::io::AsyncWriteExt;

    // The file must never exist world-readable, not even for the instant
    // between create and chmod: open it at 0600 from the start (via
    // `mode`, which `OpenOptions` applies at creation time, not after),
    // so the credentials this config carries are never exposed to a
    // typical 022 umask (spec.md §4.I, §8 no-credential-leakage invariant).
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(body).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn write_with_owner_only_perms(path: &std::path::Path, body: &[u8]) -> Result<()> {
    tokio::fs::write(path, body).await?;
    Ok(())
}
