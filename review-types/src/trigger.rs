use serde::{Deserialize, Serialize};

use crate::Platform;

/// Normalised output of Event Intake (spec.md §4.A), independent of the
/// forge-specific webhook shape it was decoded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTrigger {
    pub org_slug: String,
    pub platform: Platform,
    /// Forge-native repo identity (GitHub numeric id or GitLab path).
    pub repo_external_id: String,
    pub repo_full_name: String,
    pub is_private: bool,
    pub pr_number: u64,
    pub head_sha: String,
    pub base_branch: String,
    pub clone_url: String,
}
