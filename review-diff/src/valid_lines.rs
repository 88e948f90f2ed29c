//! Per-file set of new-version line numbers that are legal targets for
//! inline comments on the right side of the diff (spec.md §4.G).

use std::collections::{BTreeSet, HashMap};

use crate::model::{DiffHunk, DiffLine};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidLineSet(pub BTreeSet<u32>);

impl ValidLineSet {
    pub fn contains(&self, line: u32) -> bool {
        self.0.contains(&line)
    }
}

/// Builds the `ValidLineSet` for one file's hunks: only `+` lines are
/// valid; context lines advance the new-line cursor but are never
/// themselves postable, and `-` lines don't touch the new-line cursor at
/// all (mirrored directly from the teacher's `DiffLine::Added/Removed/
/// Context` cursor bookkeeping in the parser).
pub fn build_valid_line_set(hunks: &[DiffHunk]) -> ValidLineSet {
    let mut set = BTreeSet::new();
    for hunk in hunks {
        for line in &hunk.lines {
            if let DiffLine::Added { new_line, .. } = line {
                set.insert(*new_line);
            }
        }
    }
    ValidLineSet(set)
}

/// Convenience: valid-line sets for every file in a changeset, keyed by
/// path. Re-serialising this map and re-applying it against the same
/// hunks must reproduce the same sets (spec.md §8 round-trip law).
pub fn build_valid_line_map(files: &[(String, Vec<DiffHunk>)]) -> HashMap<String, ValidLineSet> {
    files
        .iter()
        .map(|(path, hunks)| (path.clone(), build_valid_line_set(hunks)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_hunks;

    #[test]
    fn added_only_hunk_yields_contiguous_range() {
        let patch = "@@ -10,0 +10,5 @@\n+a\n+b\n+c\n+d\n+e\n";
        let hunks = parse_hunks(patch);
        let set = build_valid_line_set(&hunks);
        assert_eq!(set.0, (10..=14).collect());
    }

    #[test]
    fn deletion_only_hunk_has_empty_valid_line_set() {
        let patch = "@@ -10,3 +10,0 @@\n-a\n-b\n-c\n";
        let hunks = parse_hunks(patch);
        let set = build_valid_line_set(&hunks);
        assert!(set.0.is_empty());
    }

    #[test]
    fn context_lines_are_not_valid_targets() {
        let patch = "@@ -10,3 +10,3 @@\n context1\n+added\n context2\n";
        let hunks = parse_hunks(patch);
        let set = build_valid_line_set(&hunks);
        assert_eq!(set.0, [11].into_iter().collect());
    }
}
