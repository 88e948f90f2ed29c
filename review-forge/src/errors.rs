use thiserror::Error;

/// Mirrors spec.md §7's `ForgeTransient`/`ForgePermanent` split: transient
/// faults retry via the queue, permanent ones surface as a failed review.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("transient forge error: {0}")]
    Transient(String),
    #[error("permanent forge error: {0}")]
    Permanent(String),
    #[error("installation not found: {0}")]
    InstallationNotFound(i64),
}

pub type Result<T> = std::result::Result<T, ForgeError>;

impl From<reqwest::Error> for ForgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            return ForgeError::Transient(e.to_string());
        }
        match e.status().map(|s| s.as_u16()) {
            Some(code) if (500..600).contains(&code) => ForgeError::Transient(format!("server error {code}")),
            Some(code) => ForgeError::Permanent(format!("http status {code}")),
            None => ForgeError::Transient(e.to_string()),
        }
    }
}
