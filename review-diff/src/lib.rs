//! Diff/Chunker (spec.md §4.G): parses unified diff into per-file hunks, a
//! valid-line map, and chunk fingerprints.

pub mod fingerprint;
pub mod model;
pub mod parse;
pub mod valid_lines;

pub use fingerprint::{ChunkFingerprint, fingerprint_hunk, local_fingerprint, normalise_path};
pub use model::{DiffHunk, DiffLine, FileDiff};
pub use parse::{looks_like_binary_patch, parse_hunks};
pub use valid_lines::{ValidLineSet, build_valid_line_map, build_valid_line_set};

use serde::{Deserialize, Serialize};

/// One chunk ready for cache lookup / analyzer dispatch: a file + a hunk +
/// its fingerprint, the unit both `review-cache` and `review-analyzer`
/// operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub file: String,
    pub hunk: DiffHunk,
    pub fingerprint: ChunkFingerprint,
}

/// Parses one file's raw patch text into a [`FileDiff`], detecting binary
/// patches before attempting to parse hunks out of them.
pub fn parse_file_patch(path: &str, patch: &str) -> FileDiff {
    if looks_like_binary_patch(patch) {
        return FileDiff {
            path: path.to_string(),
            hunks: Vec::new(),
            is_binary: true,
        };
    }
    FileDiff {
        path: path.to_string(),
        hunks: parse_hunks(patch),
        is_binary: false,
    }
}

/// Fingerprints every hunk of a parsed file, using the external chunker
/// when configured and falling back to the local formula per-hunk.
pub async fn chunk_file(
    client: &reqwest::Client,
    indexer_url: Option<&str>,
    file: &FileDiff,
) -> Vec<Chunk> {
    let mut out = Vec::with_capacity(file.hunks.len());
    for hunk in &file.hunks {
        let fp = fingerprint_hunk(client, indexer_url, &file.path, hunk).await;
        out.push(Chunk {
            file: file.path.clone(),
            hunk: hunk.clone(),
            fingerprint: fp,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_has_no_chunks_and_empty_valid_lines() {
        let file = parse_file_patch("a.rs", "");
        assert!(file.hunks.is_empty());
        let set = build_valid_line_set(&file.hunks);
        assert!(set.0.is_empty());
    }

    #[test]
    fn binary_patch_produces_no_hunks() {
        let file = parse_file_patch("img.png", "Binary files a/img.png and b/img.png differ");
        assert!(file.is_binary);
        assert!(file.hunks.is_empty());
    }
}
