use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// All variants carry `[Analyzer Driver]` in their message so bubbled-up
/// errors are easy to attribute in logs, following the same
/// service-prefix convention as the provider config errors this crate
/// is grounded on.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("[Analyzer Driver] failed to spawn analyzer process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("[Analyzer Driver] I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[Analyzer Driver] analyzer exited with status {status}, stderr tail: {stderr_tail}")]
    ExecError { status: String, stderr_tail: String },

    #[error("[Analyzer Driver] no valid JSON object found in analyzer stdout: {0}")]
    ProtocolError(String),

    #[error("[Analyzer Driver] analyzer exceeded timeout of {0:?}")]
    Timeout(Duration),
}
