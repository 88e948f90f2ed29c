//! Metrics Sink (spec.md §4.L): in-process counters for completed
//! pipeline runs, plus a bounded ring of recent durations.
//!
//! Generalizes the teacher's `tracing::info!` stage-summary lines
//! (`mr-reviewer/src/review/mod.rs`'s per-run `info!(targets_total,
//! drafts_total, escalated_total, ...)`) into a structured sink a caller
//! can both log *and* read back, rather than only ever write to the log
//! stream.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::info;

const DURATION_RING_CAPACITY: usize = 1000;

/// One completed pipeline run's outcome, recorded in a single call so the
/// sink never observes a run as half-updated.
#[derive(Debug, Clone, Copy)]
pub struct ReviewOutcome {
    pub success: bool,
    /// Per-chunk cache hits/misses for this run (spec.md scenario 4: "1
    /// hit, 1 miss").
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub incremental: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    incremental: AtomicU64,
    full: AtomicU64,
}

/// Process-wide review metrics. Cheap to clone (an `Arc` internally would
/// be the caller's concern; this type itself holds no `Arc` because every
/// caller in this workspace shares one instance behind `AppState`/worker
/// state, matching the teacher's "one long-lived handle passed by
/// reference" shape).
pub struct Metrics {
    counters: Counters,
    durations: Mutex<VecDeque<u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Counters::default(),
            durations: Mutex::new(VecDeque::with_capacity(DURATION_RING_CAPACITY)),
        }
    }

    /// Records one completed pipeline run. Logs a structured summary at
    /// the same point, mirroring the teacher's per-run `info!` line.
    pub fn record(&self, outcome: ReviewOutcome) {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        if outcome.success {
            self.counters.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.cache_hits.fetch_add(outcome.cache_hits, Ordering::Relaxed);
        self.counters.cache_misses.fetch_add(outcome.cache_misses, Ordering::Relaxed);
        if outcome.incremental {
            self.counters.incremental.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.full.fetch_add(1, Ordering::Relaxed);
        }

        let mut ring = self.durations.lock().expect("metrics duration ring poisoned");
        if ring.len() == DURATION_RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(outcome.duration_ms);
        drop(ring);

        info!(
            success = outcome.success,
            cache_hits = outcome.cache_hits,
            cache_misses = outcome.cache_misses,
            incremental = outcome.incremental,
            duration_ms = outcome.duration_ms,
            "review completed"
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self.durations.lock().expect("metrics duration ring poisoned");
        let count = durations.len() as u64;
        let average_duration_ms = if count == 0 { 0.0 } else { durations.iter().sum::<u64>() as f64 / count as f64 };
        drop(durations);

        let total = self.counters.total.load(Ordering::Relaxed);
        let success = self.counters.success.load(Ordering::Relaxed);
        let failed = self.counters.failed.load(Ordering::Relaxed);
        let cache_hits = self.counters.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.counters.cache_misses.load(Ordering::Relaxed);
        let incremental = self.counters.incremental.load(Ordering::Relaxed);
        let full = self.counters.full.load(Ordering::Relaxed);
        let cache_total = cache_hits + cache_misses;

        MetricsSnapshot {
            total,
            success,
            failed,
            cache_hits,
            cache_misses,
            incremental,
            full,
            success_rate: if total == 0 { 0.0 } else { success as f64 / total as f64 },
            cache_hit_rate: if cache_total == 0 { 0.0 } else { cache_hits as f64 / cache_total as f64 },
            average_duration_ms,
        }
    }
}

/// Read-only, serializable view over [`Metrics`], suitable for the
/// `GET /metrics/reviews` introspection endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub incremental: u64,
    pub full: u64,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub average_duration_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink_reports_zero_rates_not_nan() {
        let metrics = Metrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.total, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.cache_hit_rate, 0.0);
    }

    #[test]
    fn records_accumulate_and_derive_rates() {
        let metrics = Metrics::new();
        metrics.record(ReviewOutcome { success: true, cache_hits: 1, cache_misses: 1, incremental: true, duration_ms: 100 });
        metrics.record(ReviewOutcome { success: false, cache_hits: 0, cache_misses: 2, incremental: false, duration_ms: 300 });

        let snap = metrics.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.success, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.incremental, 1);
        assert_eq!(snap.full, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 3);
        assert!((snap.cache_hit_rate - 0.25).abs() < 1e-9);
        assert_eq!(snap.average_duration_ms, 200.0);
    }

    #[test]
    fn duration_ring_is_bounded() {
        let metrics = Metrics::new();
        for i in 0..(DURATION_RING_CAPACITY + 10) {
            metrics.record(ReviewOutcome {
                success: true,
                cache_hits: 0,
                cache_misses: 0,
                incremental: false,
                duration_ms: i as u64,
            });
        }
        let ring = metrics.durations.lock().unwrap();
        assert_eq!(ring.len(), DURATION_RING_CAPACITY);
        // Oldest entries (0..10) should have been evicted.
        assert_eq!(*ring.front().unwrap(), 10);
    }
}
