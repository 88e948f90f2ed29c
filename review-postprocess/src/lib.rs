//! Finding Post-processor (spec.md §4.J): attribution, validation,
//! suppression, cache write-back, aggregation — run, in that order, over
//! the union of cached and freshly-analyzed findings.

pub mod aggregate;
pub mod attribution;
pub mod suppress;
pub mod validate;

pub use aggregate::{AggregatedReview, Recommendation};
pub use suppress::FeedbackIndex;
pub use validate::Bucket;

use std::collections::HashMap;

use chrono::Duration as ChronoDuration;
use review_cache::FindingCache;
use review_diff::{Chunk, ValidLineSet};
use review_types::{Finding, OrgId, RepoId, Severity};
use tracing::{info, instrument};

fn parse_severity(raw: &str) -> Severity {
    match raw.to_ascii_lowercase().as_str() {
        "error" | "high" => Severity::Error,
        "warning" | "medium" => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Every fresh finding the analyzer returned, tagged with which
/// fingerprint produced it so step 4 can write it back to the right
/// cache key. A finding belongs to the chunk whose new-line range
/// contains its reported line — chunk ranges never overlap within a
/// file, so this assignment is unambiguous.
fn assign_to_chunk<'a>(file: &str, line: u32, fresh_chunks: &'a [Chunk]) -> Option<&'a Chunk> {
    fresh_chunks.iter().find(|c| c.file == file && line >= c.hunk.new_start && line <= c.hunk.new_end())
}

pub struct PostprocessInput<'a> {
    pub org_id: OrgId,
    pub repo_id: RepoId,
    pub pr_files: &'a [String],
    pub valid_lines: &'a HashMap<String, ValidLineSet>,
    /// Findings reused from the cache, already attached to the chunk
    /// whose fingerprint hit.
    pub cached_findings: Vec<review_analyzer::RawFinding>,
    /// Chunks that missed the cache and were sent to the analyzer.
    pub fresh_chunks: &'a [Chunk],
    /// The analyzer's raw findings for `fresh_chunks`.
    pub fresh_findings: Vec<review_analyzer::RawFinding>,
    pub cache_ttl: ChronoDuration,
    pub suppression_threshold: usize,
    pub learning_window_days: i64,
}

#[instrument(skip_all, fields(repo_id = %input.repo_id))]
pub async fn process<C: FindingCache, F: FeedbackIndex>(
    input: PostprocessInput<'_>,
    cache: &C,
    feedback: &F,
) -> AggregatedReview {
    // Step 4 (cache write-back) runs over the fresh set only, before
    // suppression/bucketing, since the cache stores the analyzer's raw
    // output — a tenant's dismissal preference is applied at render time,
    // never persisted into the shared cache.
    write_back_cache(input.repo_id, input.fresh_chunks, &input.fresh_findings, cache, input.cache_ttl).await;

    let mut review = AggregatedReview::default();
    let all = input.cached_findings.into_iter().chain(input.fresh_findings.clone());

    for raw in all {
        let attributed = attribution::attribute_file(&raw.file, input.pr_files).map(|s| s.to_string());
        let bucket = validate::classify(attributed.as_deref(), raw.line, input.valid_lines);
        let finding = Finding {
            file: attributed.clone().unwrap_or_else(|| raw.file.clone()),
            line: raw.line,
            severity: parse_severity(&raw.severity),
            category: raw.category.clone(),
            message: raw.message.clone(),
            fix: raw.fix.clone(),
        };

        match bucket {
            Bucket::SkippedFileNotFound => review.skipped_file_not_found.push(finding),
            Bucket::SkippedInvalidLine => review.skipped_invalid_line.push(finding),
            Bucket::Postable => {
                let suppressed = suppress::is_suppressed(
                    feedback,
                    input.org_id,
                    &finding.file,
                    finding.line,
                    input.suppression_threshold,
                    input.learning_window_days,
                )
                .await;
                if suppressed {
                    review.suppressed.push(finding);
                } else {
                    review.record(finding);
                }
            }
        }
    }

    info!(
        errors = review.errors,
        warnings = review.warnings,
        info = review.info,
        skipped_file_not_found = review.skipped_file_not_found.len(),
        skipped_invalid_line = review.skipped_invalid_line.len(),
        suppressed = review.suppressed.len(),
        "post-processed findings"
    );
    review
}

async fn write_back_cache<C: FindingCache>(
    repo_id: RepoId,
    fresh_chunks: &[Chunk],
    fresh_findings: &[review_analyzer::RawFinding],
    cache: &C,
    ttl: ChronoDuration,
) {
    let mut by_chunk: HashMap<String, Vec<Finding>> = HashMap::new();
    for raw in fresh_findings {
        let Some(chunk) = assign_to_chunk(&raw.file, raw.line, fresh_chunks) else {
            continue;
        };
        by_chunk.entry(chunk.fingerprint.to_string()).or_default().push(Finding {
            file: raw.file.clone(),
            line: raw.line,
            severity: parse_severity(&raw.severity),
            category: raw.category.clone(),
            message: raw.message.clone(),
            fix: raw.fix.clone(),
        });
    }
    let ttl_std = ttl.to_std().unwrap_or(std::time::Duration::from_secs(24 * 3600));
    for chunk in fresh_chunks {
        let findings = by_chunk.remove(&chunk.fingerprint.to_string()).unwrap_or_default();
        if let Err(e) = cache.put(repo_id, &chunk.file, &chunk.fingerprint, findings, ttl_std) {
            tracing::warn!(error = %e, fingerprint = %chunk.fingerprint, "cache write-back failed");
        }
    }
}
