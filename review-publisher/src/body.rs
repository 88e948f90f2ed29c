//! Review body assembly: a summary table, the top findings, and two
//! collapsed sections preserving the full text of whatever couldn't be
//! posted inline (spec.md §4.K).

use review_postprocess::AggregatedReview;
use review_types::Finding;

/// Hidden per-comment marker, generalized from the teacher's
/// `<!-- mrai:key=... -->` idempotency marker
/// (`mr-reviewer/src/publish/gitlab.rs`) so a retried submission's
/// comments remain recognisable as the same logical finding even though
/// this forge's review API is a single atomic call rather than the
/// teacher's per-discussion posting loop.
pub fn idempotency_marker(finding: &Finding) -> String {
    format!("<!-- review-core:key={}:{};cat={} -->", finding.file, finding.line, finding.category)
}

pub fn render_comment_body(finding: &Finding) -> String {
    let prefix = match finding.severity {
        review_types::Severity::Error => "🛑",
        review_types::Severity::Warning => "⚠️",
        review_types::Severity::Info => "ℹ️",
    };
    let mut body = format!("{prefix} **{}** — {}", finding.category, finding.message);
    if let Some(fix) = &finding.fix {
        body.push_str("\n\n```suggestion\n");
        body.push_str(fix);
        body.push_str("\n```");
    }
    body.push_str("\n\n");
    body.push_str(&idempotency_marker(finding));
    body
}

const TOP_FINDINGS_LIMIT: usize = 20;

/// Builds the review's top-level body: a summary table, the highest
/// severity findings (capped so the body itself stays readable even
/// when most findings are already posted inline), and two `<details>`
/// sections holding every skipped finding verbatim.
pub fn render_summary(review: &AggregatedReview) -> String {
    let mut body = String::new();
    body.push_str("## Review summary\n\n");
    body.push_str("| Errors | Warnings | Info |\n|---:|---:|---:|\n");
    body.push_str(&format!("| {} | {} | {} |\n\n", review.errors, review.warnings, review.info));

    if review.postable.is_empty() {
        body.push_str("No issues found.\n\n");
    } else {
        body.push_str("### Top findings\n\n");
        let mut sorted = review.postable.clone();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
        for finding in sorted.iter().take(TOP_FINDINGS_LIMIT) {
            body.push_str(&format!("- `{}:{}` {} — {}\n", finding.file, finding.line, finding.category, finding.message));
        }
        if sorted.len() > TOP_FINDINGS_LIMIT {
            body.push_str(&format!("\n_...and {} more, posted inline._\n", sorted.len() - TOP_FINDINGS_LIMIT));
        }
        body.push('\n');
    }

    push_skipped_section(&mut body, "Findings outside the diff (file not found)", &review.skipped_file_not_found);
    push_skipped_section(&mut body, "Findings outside the diff (invalid line)", &review.skipped_invalid_line);
    if !review.suppressed.is_empty() {
        push_skipped_section(&mut body, "Suppressed by prior feedback", &review.suppressed);
    }

    body
}

fn push_skipped_section(body: &mut String, title: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    body.push_str(&format!("<details>\n<summary>{title} ({})</summary>\n\n", findings.len()));
    for finding in findings {
        body.push_str(&format!("- `{}:{}` {} — {}\n", finding.file, finding.line, finding.category, finding.message));
    }
    body.push_str("\n</details>\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_types::Severity;

    fn finding(severity: Severity) -> Finding {
        Finding { file: "a.rs".into(), line: 1, severity, category: "bug".into(), message: "oops".into(), fix: None }
    }

    #[test]
    fn empty_review_says_no_issues() {
        let review = AggregatedReview::default();
        let body = render_summary(&review);
        assert!(body.contains("No issues found."));
    }

    #[test]
    fn skipped_sections_only_appear_when_non_empty() {
        let mut review = AggregatedReview::default();
        review.record(finding(Severity::Warning));
        let body = render_summary(&review);
        assert!(!body.contains("Findings outside the diff"));

        review.skipped_invalid_line.push(finding(Severity::Info));
        let body = render_summary(&review);
        assert!(body.contains("Findings outside the diff (invalid line)"));
    }
}
