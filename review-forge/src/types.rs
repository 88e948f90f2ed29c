use serde::{Deserialize, Serialize};

/// One entry of `ListPRFiles`: `{filename, patch}` per spec.md §6.
/// `patch` is `None` for binary files (the forge omits it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFile {
    pub filename: String,
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrAuthor {
    pub login: String,
    pub is_bot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
    Comment,
    RequestChanges,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineComment {
    pub path: String,
    pub line: u32,
    pub body: String,
    /// Always RIGHT per spec.md §4.K — kept explicit on the wire type
    /// rather than assumed, since a forge client is the seam where a
    /// second provider with a LEFT/RIGHT diff model would need it.
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Right,
}

/// One atomic submission: body + event + every postable inline comment,
/// sent as a single API call (spec.md §4.K "partial posting is
/// forbidden").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub commit_id: String,
    pub body: String,
    pub event: ReviewEvent,
    pub comments: Vec<InlineComment>,
}
