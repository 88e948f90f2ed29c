use thiserror::Error;

/// Every way a single job can fail to complete. Distinguishes retryable
/// infra faults from permanent ones per spec.md §7's failure semantics —
/// `is_retryable` drives whether the worker nacks the job (queue retry)
/// or marks the Review failed outright.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("workspace error: {0}")]
    Workspace(#[from] review_workspace::WorkspaceError),

    #[error("analyzer error: {0}")]
    Analyzer(#[from] review_analyzer::AnalyzerError),

    #[error("forge error: {0}")]
    Forge(#[from] review_forge::ForgeError),

    #[error("cache error: {0}")]
    Cache(#[from] review_cache::CacheError),

    #[error("store error: {0}")]
    Store(#[from] review_store::StoreError),

    #[error("no forge credentials configured for platform {0:?}")]
    MissingCredentials(review_types::Platform),

    #[error("review exceeded its timeout")]
    Timeout,

    #[error("job was cancelled during shutdown")]
    Cancelled,

    #[error("review was superseded by a newer head_sha for this PR")]
    Superseded,
}

impl PipelineError {
    /// Transient infra faults retry via the queue; malformed analyzer
    /// output and missing credentials are bugs/misconfiguration and fail
    /// immediately (spec.md §7: "Malformed analyzer output: failed
    /// immediately (bug, not flake)").
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Analyzer(review_analyzer::AnalyzerError::ProtocolError(_)) => false,
            PipelineError::Analyzer(_) => true,
            PipelineError::Forge(review_forge::ForgeError::Transient(_)) => true,
            PipelineError::Forge(_) => false,
            PipelineError::Workspace(_) => true,
            PipelineError::Cache(_) => true,
            PipelineError::Store(review_store::StoreError::Conflict(_)) => true,
            PipelineError::Store(_) => false,
            PipelineError::MissingCredentials(_) => false,
            PipelineError::Timeout => true,
            PipelineError::Cancelled => true,
            // The review that superseded this one already owns the
            // (repo_id, pr_number) pair; retrying would just race it again.
            PipelineError::Superseded => false,
        }
    }
}
