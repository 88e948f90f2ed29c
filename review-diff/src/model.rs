use serde::{Deserialize, Serialize};

/// One line inside a diff hunk, tagged with which side(s) of the diff it
/// belongs to. Context and removed lines are never valid comment targets;
/// only `Added` lines are (see [`crate::valid_lines`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiffLine {
    Added { new_line: u32, content: String },
    Removed { old_line: u32, content: String },
    Context { old_line: u32, new_line: u32, content: String },
}

/// A contiguous run of diff lines within one file — the unit of caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Inclusive end line of this hunk in the new file.
    pub fn new_end(&self) -> u32 {
        self.new_start + self.new_lines.saturating_sub(1)
    }

    /// Concatenated text of every `+` line in this hunk, newline-joined, in
    /// order. Used as the content component of the chunk fingerprint.
    pub fn added_text(&self) -> String {
        self.lines
            .iter()
            .filter_map(|l| match l {
                DiffLine::Added { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-file diff: the hunks plus whether the file was detected as binary
/// (binary patches never produce hunks or a `ValidLineSet`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<DiffHunk>,
    pub is_binary: bool,
}
