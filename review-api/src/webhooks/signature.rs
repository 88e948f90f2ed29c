//! HMAC-SHA256 webhook signature verification (spec.md §4.A), plus the
//! GitLab plain shared-secret-token variant ("or equivalent" scheme the
//! same section allows for non-GitHub forges). Both comparisons run in
//! constant time so response latency never leaks how many leading bytes
//! of the signature matched.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies `header_value` (`"sha256=<hex>"`) is a valid HMAC-SHA256 of
/// `raw_body` under `secret`. Must be called against the raw bytes
/// *before* any JSON decoding (spec.md §4.A: "verify the signature
/// against the raw bytes before decoding").
pub fn verify_hmac_sha256(secret: &[u8], raw_body: &[u8], header_value: &str) -> bool {
    let Some(hex_sig) = header_value.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(raw_body);
    // `verify_slice` is a constant-time comparison internally.
    mac.verify_slice(&expected).is_ok()
}

/// Constant-time equality for the plain shared-secret token GitLab sends
/// in `X-Gitlab-Token` (GitLab has no HMAC-over-body scheme; the token
/// itself is the shared secret, compared directly).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_verifies() {
        let secret = b"shh";
        let body = b"{\"hello\":\"world\"}";
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(body);
        let sig = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
        assert!(verify_hmac_sha256(secret, body, &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let secret = b"shh";
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(b"original");
        let sig = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
        assert!(!verify_hmac_sha256(secret, b"tampered", &sig));
    }

    #[test]
    fn missing_prefix_fails() {
        assert!(!verify_hmac_sha256(b"shh", b"body", "deadbeef"));
    }

    #[test]
    fn token_equality_is_exact() {
        assert!(constant_time_eq(b"abc123", b"abc123"));
        assert!(!constant_time_eq(b"abc123", b"abc124"));
        assert!(!constant_time_eq(b"abc123", b"abc12"));
    }
}
