use chrono::{DateTime, Utc};

/// Short-lived credential for a forge installation. Consumers must
/// re-fetch when within `SAFETY_MARGIN` of `expires_at` (see
/// `review-forge::token`).
#[derive(Debug, Clone)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    pub const SAFETY_MARGIN_SECS: i64 = 60;

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        (self.expires_at - now).num_seconds() <= Self::SAFETY_MARGIN_SECS
    }
}
