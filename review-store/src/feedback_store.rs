use std::collections::HashMap;

use chrono::{DateTime, Utc};
use review_types::{FeedbackDecision, FeedbackRecord, OrgId};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::errors::Result;

/// `review_feedback` table, `(review_id, comment_id) -> decision` with a
/// `(org_id, file_path, line_number)` index, read-only from
/// `review-postprocess`'s perspective (the learning/feedback ingestion
/// path that writes it is out of scope — spec.md §1).
#[derive(Default)]
pub struct FeedbackStore {
    rows: RwLock<Vec<FeedbackRecord>>,
    by_location: RwLock<HashMap<(OrgId, String, u32), Vec<usize>>>,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: FeedbackRecord) -> Result<()> {
        let mut rows = self.rows.write().await;
        let idx = rows.len();
        let key = (record.org_id, record.file_path.clone(), record.line_number);
        self.by_location.write().await.entry(key).or_default().push(idx);
        rows.push(record);
        Ok(())
    }

    /// Count of `Dismissed` decisions for `(org_id, file, line)` within
    /// `window`, as `review-postprocess`'s suppression step consumes
    /// (spec.md §4.J step 3, default N=3 over a default 30-day window).
    pub async fn dismissal_count_within(
        &self,
        org_id: OrgId,
        file: &str,
        line: u32,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        let by_location = self.by_location.read().await;
        let Some(idxs) = by_location.get(&(org_id, file.to_string(), line)) else {
            return Ok(0);
        };
        let rows = self.rows.read().await;
        Ok(idxs
            .iter()
            .filter_map(|i| rows.get(*i))
            .filter(|r| r.decision == FeedbackDecision::Dismissed && r.created_at >= since)
            .count())
    }

    /// `GET /feedback/patterns`: counts of each decision kind recorded for
    /// an org, across all locations.
    pub async fn distribution_for_org(&self, org_id: OrgId) -> Result<FeedbackDistribution> {
        let rows = self.rows.read().await;
        let mut distribution = FeedbackDistribution::default();
        for row in rows.iter().filter(|r| r.org_id == org_id) {
            match row.decision {
                FeedbackDecision::Accepted => distribution.accepted += 1,
                FeedbackDecision::Dismissed => distribution.dismissed += 1,
                FeedbackDecision::Fixed => distribution.fixed += 1,
            }
        }
        Ok(distribution)
    }

    /// `GET /feedback/preferences`: `(file, line)` locations that have
    /// crossed the same suppression threshold `review-postprocess`'s
    /// `suppress::is_suppressed` applies, i.e. the rules currently in
    /// effect for this org rather than the raw feedback log.
    pub async fn suppressed_locations_for_org(
        &self,
        org_id: OrgId,
        threshold: usize,
        window_days: i64,
    ) -> Result<Vec<(String, u32)>> {
        let since = Utc::now() - chrono::Duration::days(window_days);
        let by_location = self.by_location.read().await;
        let rows = self.rows.read().await;
        let mut out = Vec::new();
        for (key, idxs) in by_location.iter() {
            if key.0 != org_id {
                continue;
            }
            let count = idxs
                .iter()
                .filter_map(|i| rows.get(*i))
                .filter(|r| r.decision == FeedbackDecision::Dismissed && r.created_at >= since)
                .count();
            if count >= threshold {
                out.push((key.1.clone(), key.2));
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct FeedbackDistribution {
    pub accepted: usize,
    pub dismissed: usize,
    pub fixed: usize,
}
