//! Step 1: attribution — matching an analyzer finding's reported file to
//! one of the PR's actual changed files.

use review_diff::normalise_path;

/// Resolves `finding_file` against `pr_files`: exact match first, then
/// path-normalisation (strip a leading `./`) followed by a suffix match
/// in either direction, since analyzers sometimes report a path relative
/// to a different root than the forge's file list.
pub fn attribute_file<'a>(finding_file: &str, pr_files: &'a [String]) -> Option<&'a str> {
    let normalised = normalise_path(finding_file);
    if let Some(exact) = pr_files.iter().find(|f| f.as_str() == normalised) {
        return Some(exact.as_str());
    }
    pr_files
        .iter()
        .find(|f| {
            let f_norm = normalise_path(f);
            f_norm.ends_with(normalised) || normalised.ends_with(f_norm)
        })
        .map(|f| f.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        let files = vec!["src/lib.rs".to_string(), "src/main.rs".to_string()];
        assert_eq!(attribute_file("src/lib.rs", &files), Some("src/lib.rs"));
    }

    #[test]
    fn leading_dot_slash_is_stripped_before_matching() {
        let files = vec!["src/lib.rs".to_string()];
        assert_eq!(attribute_file("./src/lib.rs", &files), Some("src/lib.rs"));
    }

    #[test]
    fn suffix_match_finds_a_differently_rooted_path() {
        let files = vec!["packages/app/src/lib.rs".to_string()];
        assert_eq!(attribute_file("src/lib.rs", &files), Some("packages/app/src/lib.rs"));
    }

    #[test]
    fn no_match_returns_none() {
        let files = vec!["src/other.rs".to_string()];
        assert_eq!(attribute_file("src/lib.rs", &files), None);
    }
}
