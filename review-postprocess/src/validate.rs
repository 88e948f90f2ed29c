//! Step 2: validation — bucket every attributed finding by whether it
//! lands on a line a forge will actually accept an inline comment on.

use std::collections::HashMap;

use review_diff::ValidLineSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Postable,
    SkippedFileNotFound,
    SkippedInvalidLine,
}

pub fn classify(attributed_file: Option<&str>, line: u32, valid_lines: &HashMap<String, ValidLineSet>) -> Bucket {
    let Some(file) = attributed_file else {
        return Bucket::SkippedFileNotFound;
    };
    match valid_lines.get(file) {
        Some(set) if set.contains(line) => Bucket::Postable,
        _ => Bucket::SkippedInvalidLine,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn missing_file_is_file_not_found() {
        let map = HashMap::new();
        assert_eq!(classify(None, 5, &map), Bucket::SkippedFileNotFound);
    }

    #[test]
    fn line_outside_valid_set_is_invalid_line() {
        let mut map = HashMap::new();
        map.insert("a.rs".to_string(), ValidLineSet(BTreeSet::from([10, 11])));
        assert_eq!(classify(Some("a.rs"), 99, &map), Bucket::SkippedInvalidLine);
    }

    #[test]
    fn line_inside_valid_set_is_postable() {
        let mut map = HashMap::new();
        map.insert("a.rs".to_string(), ValidLineSet(BTreeSet::from([10, 11])));
        assert_eq!(classify(Some("a.rs"), 10, &map), Bucket::Postable);
    }
}
