//! GitHub App installation token minting and the single-flight refresh
//! cache that sits in front of it.
//!
//! Installation tokens are scarce (GitHub rate-limits the minting
//! endpoint) and short-lived (1 hour). Every organization gets its own
//! `Arc<Mutex<Option<InstallationToken>>>` slot: the first caller past
//! expiry holds the lock for the refresh HTTP call, every other caller
//! that arrives while the refresh is in flight blocks on the same lock
//! and simply observes the token it produced, rather than each firing
//! its own mint request.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use review_types::InstallationToken;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::errors::{ForgeError, Result};

#[derive(Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// Mints a short-lived (10 minute) App JWT for the `/app/...` GitHub
/// endpoints. `private_key_pem` is the App's PKCS#1/PKCS#8 RSA key.
pub fn mint_app_jwt(app_id: i64, private_key_pem: &[u8]) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ForgeError::Permanent(format!("system clock before epoch: {e}")))?
        .as_secs() as i64;
    let claims = AppClaims {
        // Backdate by 60s to tolerate clock drift with GitHub's servers.
        iat: now - 60,
        exp: now + 9 * 60,
        iss: app_id.to_string(),
    };
    let key = EncodingKey::from_rsa_pem(private_key_pem)
        .map_err(|e| ForgeError::Permanent(format!("invalid app private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| ForgeError::Permanent(format!("jwt encode failed: {e}")))
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Calls GitHub's `POST /app/installations/{id}/access_tokens` using a
/// freshly minted App JWT.
#[instrument(skip(http, app_private_key_pem))]
async fn mint_installation_token(
    http: &Client,
    base_api: &str,
    app_id: i64,
    app_private_key_pem: &[u8],
    installation_id: i64,
) -> Result<InstallationToken> {
    let jwt = mint_app_jwt(app_id, app_private_key_pem)?;
    let url = format!("{base_api}/app/installations/{installation_id}/access_tokens");
    let resp: AccessTokenResponse = http
        .post(url)
        .header("Authorization", format!("Bearer {jwt}"))
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "review-core/0.1")
        .send()
        .await?
        .error_for_status()
        .map_err(|e| {
            if e.status().map(|s| s.as_u16()) == Some(404) {
                ForgeError::InstallationNotFound(installation_id)
            } else {
                ForgeError::from(e)
            }
        })?
        .json()
        .await?;
    Ok(InstallationToken { token: resp.token, expires_at: resp.expires_at })
}

/// Per-installation single-flight cache of installation access tokens.
pub struct InstallationTokenCache {
    http: Client,
    base_api: String,
    app_id: i64,
    app_private_key_pem: Vec<u8>,
    slots: DashMap<i64, Arc<Mutex<Option<InstallationToken>>>>,
}

impl InstallationTokenCache {
    pub fn new(http: Client, base_api: String, app_id: i64, app_private_key_pem: Vec<u8>) -> Self {
        Self { http, base_api, app_id, app_private_key_pem, slots: DashMap::new() }
    }

    /// Returns a valid token for `installation_id`, refreshing it if
    /// absent or within the safety margin of expiry. Concurrent callers
    /// for the same installation share one refresh.
    pub async fn get(&self, installation_id: i64) -> Result<InstallationToken> {
        let slot = self
            .slots
            .entry(installation_id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        let mut guard = slot.lock().await;
        if let Some(existing) = guard.as_ref() {
            if !existing.needs_refresh(Utc::now()) {
                return Ok(existing.clone());
            }
        }
        debug!(installation_id, "refreshing installation token");
        let fresh =
            mint_installation_token(&self.http, &self.base_api, self.app_id, &self.app_private_key_pem, installation_id)
                .await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }
}
