//! Parsing the analyzer's stdout contract.

use serde::Deserialize;

use crate::errors::{AnalyzerError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerOutput {
    pub summary: String,
    pub stats: AnalyzerStats,
    pub comments: Vec<RawFinding>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerStats {
    pub errors: u32,
    pub warnings: u32,
    pub suggestions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFinding {
    pub file: String,
    pub line: u32,
    pub severity: String,
    pub category: String,
    pub message: String,
    #[serde(default)]
    pub fix: Option<String>,
}

/// Finds the first `{` and last `}` in `stdout` and parses that slice as
/// the single JSON object the analyzer must emit. Free text before or
/// after is tolerated; two concatenated top-level objects are not —
/// the first-`{`..last-`}` span covers both objects, which is not valid
/// JSON, so `serde_json` naturally rejects it and this becomes a
/// protocol error rather than silently picking one object.
pub fn extract_json(stdout: &str) -> Result<AnalyzerOutput> {
    let start = stdout.find('{').ok_or_else(|| AnalyzerError::ProtocolError("no '{' found in stdout".into()))?;
    let end = stdout.rfind('}').ok_or_else(|| AnalyzerError::ProtocolError("no '}' found in stdout".into()))?;
    if end < start {
        return Err(AnalyzerError::ProtocolError("'}' appears before '{' in stdout".into()));
    }
    let slice = &stdout[start..=end];
    serde_json::from_str(slice).map_err(|e| AnalyzerError::ProtocolError(format!("{e}: {slice}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"summary":"ok","stats":{"errors":0,"warnings":1,"suggestions":0},"comments":[],"recommendation":"approve"}"#;

    #[test]
    fn parses_object_with_surrounding_noise() {
        let stdout = format!("progress: 10%\nprogress: 90%\n{VALID}\ndone\n");
        let out = extract_json(&stdout).unwrap();
        assert_eq!(out.summary, "ok");
        assert_eq!(out.stats.warnings, 1);
    }

    #[test]
    fn two_concatenated_objects_is_a_protocol_error() {
        let stdout = format!("{VALID}{VALID}");
        assert!(extract_json(&stdout).is_err());
    }

    #[test]
    fn no_braces_is_a_protocol_error() {
        assert!(extract_json("no json here").is_err());
    }
}
