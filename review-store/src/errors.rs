use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The row's status no longer matched the expected previous state
    /// when a `CAS` transition was attempted (spec.md §7 `StoreConflict`,
    /// "retry tx"). The in-memory store emulates the SQL
    /// `UPDATE ... WHERE status = expected_prev` pattern so this is a
    /// real, testable error path rather than an idealisation.
    #[error("store conflict: row {0} was not in the expected state")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("uniqueness violation: {0}")]
    UniqueViolation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
