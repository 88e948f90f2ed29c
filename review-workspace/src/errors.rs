use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("git subprocess exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("git subprocess timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("repository not found in pool: {0}")]
    NotFound(String),
}
