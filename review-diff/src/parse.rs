//! Unified-diff parsing.
//!
//! Directly generalizes the teacher's
//! `mr-reviewer/src/parser/mod.rs::parse_unified_diff_advanced` (same
//! hunk-header parsing, same binary-patch heuristics in
//! `looks_like_binary_patch`) so that it also feeds `review-diff`'s
//! `ValidLineSet`/fingerprint derivation instead of only the provider's
//! raw `DiffHunk`/`DiffLine` pair.

use crate::model::{DiffHunk, DiffLine};

/// Parses unified diff hunk text (without `---`/`+++` file headers — those
/// are stripped by the caller, who already knows the file path from the
/// forge's per-file patch listing) into hunks. Robust to missing headers;
/// only `@@` lines are required.
pub fn parse_hunks(patch: &str) -> Vec<DiffHunk> {
    let mut hunks = Vec::new();
    let mut cur_old_start = 0u32;
    let mut cur_old_lines = 0u32;
    let mut cur_new_start = 0u32;
    let mut cur_new_lines = 0u32;
    let mut lines_buf: Vec<DiffLine> = Vec::new();
    let mut old_line = 0u32;
    let mut new_line = 0u32;
    let mut in_hunk = false;

    for line in patch.lines() {
        if line.starts_with("@@") {
            if in_hunk && !lines_buf.is_empty() {
                hunks.push(DiffHunk {
                    old_start: cur_old_start,
                    old_lines: cur_old_lines,
                    new_start: cur_new_start,
                    new_lines: cur_new_lines,
                    lines: std::mem::take(&mut lines_buf),
                });
            }
            if let Some((left, right)) = line
                .trim_start_matches('@')
                .trim_end_matches('@')
                .trim()
                .split_once('+')
            {
                let left_nums = left.trim().trim_start_matches('-');
                let right_nums = right.trim();
                let (o_start, o_len) = split_nums(left_nums);
                let (n_start, n_len) = split_nums(right_nums);
                cur_old_start = o_start;
                cur_old_lines = o_len;
                cur_new_start = n_start;
                cur_new_lines = n_len;
                old_line = o_start;
                new_line = n_start;
                in_hunk = true;
            }
            continue;
        }

        // `\ No newline at end of file` marker: not diff content.
        if line.starts_with("\\ ") {
            continue;
        }

        if !in_hunk {
            continue;
        }

        if let Some(rest) = line.strip_prefix('+') {
            lines_buf.push(DiffLine::Added {
                new_line,
                content: rest.to_string(),
            });
            new_line += 1;
        } else if let Some(rest) = line.strip_prefix('-') {
            lines_buf.push(DiffLine::Removed {
                old_line,
                content: rest.to_string(),
            });
            old_line += 1;
        } else if let Some(rest) = line.strip_prefix(' ') {
            lines_buf.push(DiffLine::Context {
                old_line,
                new_line,
                content: rest.to_string(),
            });
            old_line += 1;
            new_line += 1;
        } else {
            lines_buf.push(DiffLine::Context {
                old_line,
                new_line,
                content: line.to_string(),
            });
            old_line += 1;
            new_line += 1;
        }
    }

    if in_hunk && !lines_buf.is_empty() {
        hunks.push(DiffHunk {
            old_start: cur_old_start,
            old_lines: cur_old_lines,
            new_start: cur_new_start,
            new_lines: cur_new_lines,
            lines: lines_buf,
        });
    }
    hunks
}

fn split_nums(s: &str) -> (u32, u32) {
    let s = s.trim();
    if let Some((a, b)) = s.split_once(',') {
        (a.parse().unwrap_or(0), b.parse().unwrap_or(0))
    } else {
        (s.parse().unwrap_or(0), 0)
    }
}

/// Heuristic to detect binary patches (`git diff` emits these instead of
/// `@@` hunks; they carry no postable lines at all).
pub fn looks_like_binary_patch(s: &str) -> bool {
    s.contains("GIT binary patch")
        || s.starts_with("Binary files ")
        || (s.starts_with("Files ") && s.contains(" differ"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_addition_hunk() {
        let patch = "@@ -10,3 +10,5 @@\n line a\n+line b\n+line c\n line d\n";
        let hunks = parse_hunks(patch);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].new_start, 10);
        assert_eq!(hunks[0].new_lines, 5);
    }

    #[test]
    fn deletion_only_hunk_has_no_added_lines() {
        let patch = "@@ -10,3 +10,0 @@\n-line a\n-line b\n-line c\n";
        let hunks = parse_hunks(patch);
        assert_eq!(hunks.len(), 1);
        assert!(hunks[0].added_text().is_empty());
    }

    #[test]
    fn detects_binary_patch_markers() {
        assert!(looks_like_binary_patch("Binary files a/x.png and b/x.png differ"));
        assert!(looks_like_binary_patch("GIT binary patch\ndelta 10\n"));
        assert!(!looks_like_binary_patch("@@ -1,1 +1,1 @@\n-a\n+b\n"));
    }
}
