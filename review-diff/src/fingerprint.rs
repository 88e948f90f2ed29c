//! Content-addressed chunk fingerprints.
//!
//! spec.md §9 flags that one version of the source computes fingerprints
//! as `"path:start-end"` without the chunk text, which violates the cache
//! soundness invariant (identical fingerprint must imply identical
//! analyzer output). This implementation always picks the content-hashing
//! formula: `sha256(normalised_path ‖ new_start ‖ new_end ‖
//! text_of_added_lines)`. It embeds no timestamps, PIDs, or random salts,
//! so it is stable across runs and across processes.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::model::DiffHunk;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkFingerprint(pub String);

impl fmt::Display for ChunkFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strips a single leading `./` from a path, per spec.md §4.G.
pub fn normalise_path(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Deterministic local fingerprint formula. This is the fallback used
/// whenever no external chunker service is configured or reachable, and
/// it is also what the round-trip/idempotence tests pin down: the same
/// `(path, hunk)` always yields the same fingerprint, in this process or
/// any other.
pub fn local_fingerprint(path: &str, hunk: &DiffHunk) -> ChunkFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(normalise_path(path).as_bytes());
    hasher.update(b"\0");
    hasher.update(hunk.new_start.to_le_bytes());
    hasher.update(b"\0");
    hasher.update(hunk.new_end().to_le_bytes());
    hasher.update(b"\0");
    hasher.update(hunk.added_text().as_bytes());
    ChunkFingerprint(format!("{:x}", hasher.finalize()))
}

#[derive(Serialize)]
struct ChunkerRequest<'a> {
    path: &'a str,
    new_start: u32,
    new_end: u32,
    added_text: &'a str,
}

#[derive(Deserialize)]
struct ChunkerResponse {
    fingerprint: String,
}

/// Fingerprints a hunk, preferring an external chunker service
/// (`RUST_INDEXER_URL`) when configured, falling back to
/// [`local_fingerprint`] on any error — mirroring the teacher's
/// `try_enrich_changeset` "try richer source, fall back to local
/// derivation" shape.
pub async fn fingerprint_hunk(
    client: &reqwest::Client,
    indexer_url: Option<&str>,
    path: &str,
    hunk: &DiffHunk,
) -> ChunkFingerprint {
    if let Some(base) = indexer_url {
        let req = ChunkerRequest {
            path: normalise_path(path),
            new_start: hunk.new_start,
            new_end: hunk.new_end(),
            added_text: &hunk.added_text(),
        };
        let attempt = client
            .post(format!("{}/fingerprint", base.trim_end_matches('/')))
            .json(&req)
            .timeout(Duration::from_secs(2))
            .send()
            .await;
        match attempt {
            Ok(resp) if resp.status().is_success() => match resp.json::<ChunkerResponse>().await {
                Ok(body) => return ChunkFingerprint(body.fingerprint),
                Err(e) => warn!(error = %e, "chunker service returned invalid body, falling back to local fingerprint"),
            },
            Ok(resp) => warn!(status = %resp.status(), "chunker service returned non-success, falling back to local fingerprint"),
            Err(e) => warn!(error = %e, "chunker service unreachable, falling back to local fingerprint"),
        }
    }
    local_fingerprint(path, hunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_hunks;

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let patch = "@@ -1,0 +1,2 @@\n+hello\n+world\n";
        let hunks = parse_hunks(patch);
        let a = local_fingerprint("./src/lib.rs", &hunks[0]);
        let b = local_fingerprint("src/lib.rs", &hunks[0]);
        assert_eq!(a, b, "leading ./ must be normalised away");
    }

    #[test]
    fn different_content_yields_different_fingerprint() {
        let h1 = parse_hunks("@@ -1,0 +1,1 @@\n+hello\n");
        let h2 = parse_hunks("@@ -1,0 +1,1 @@\n+world\n");
        assert_ne!(
            local_fingerprint("a.rs", &h1[0]),
            local_fingerprint("a.rs", &h2[0])
        );
    }
}
