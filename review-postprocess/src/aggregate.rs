//! Step 5: aggregation — counts and the overall recommendation.

use review_types::{Finding, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    RequestChanges,
    Comment,
    Approve,
}

impl Recommendation {
    pub fn from_counts(errors: u32, warnings: u32) -> Self {
        if errors > 0 {
            Recommendation::RequestChanges
        } else if warnings > 0 {
            Recommendation::Comment
        } else {
            Recommendation::Approve
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregatedReview {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub postable: Vec<Finding>,
    pub skipped_file_not_found: Vec<Finding>,
    pub skipped_invalid_line: Vec<Finding>,
    pub suppressed: Vec<Finding>,
}

impl AggregatedReview {
    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_counts(self.errors, self.warnings)
    }

    pub fn record(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.info += 1,
        }
        self.postable.push(finding);
    }
}
