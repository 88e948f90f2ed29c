//! Priority Queue (spec.md §4.D): durable (within-process) at-least-once
//! job delivery with per-tenant priority classes and retry with
//! exponential backoff.
//!
//! The in-memory implementation below is the reference backend; a
//! durable broker (e.g. Redis streams) would expose the same `JobQueue`
//! surface and honour the same visibility-timeout/backoff contract.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use review_types::ReviewId;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimToken(pub Uuid);

impl ClaimToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub review_id: ReviewId,
    pub priority: i32,
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReadyEntry {
    priority: i32,
    enqueued_at: DateTime<Utc>,
    job_idx: usize,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority dispatched first; among equal priority, earlier
        // `enqueued_at` (FIFO) dispatched first. `BinaryHeap` is a max-heap
        // so we reverse the enqueued_at comparison.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.enqueued_at.cmp(&self.enqueued_at))
    }
}
impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledEntry {
    ready_at: DateTime<Utc>,
    job_idx: usize,
}
impl Ord for ScheduledEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by ready_at: reverse the natural order.
        other.ready_at.cmp(&self.ready_at)
    }
}
impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct ActiveEntry {
    job: Job,
    deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { base: Duration::from_secs(2), cap: Duration::from_secs(300), max_attempts: 5 }
    }
}

impl BackoffPolicy {
    /// `min(cap, base * 2^attempt)` plus jitter, per spec.md §4.D.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base.as_millis().saturating_mul(1u128 << attempt.min(32));
        let capped = exp.min(self.cap.as_millis());
        let jitter_ratio: f64 = rand::thread_rng().gen_range(0.0..0.25);
        let jittered = capped as f64 * (1.0 + jitter_ratio);
        Duration::from_millis(jittered as u64)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub active: usize,
    pub scheduled: usize,
    pub retry: usize,
    pub archived: usize,
}

struct Slots {
    jobs: HashMap<usize, Job>,
    next_idx: usize,
}

impl Slots {
    fn insert(&mut self, job: Job) -> usize {
        let idx = self.next_idx;
        self.next_idx += 1;
        self.jobs.insert(idx, job);
        idx
    }
}

struct State {
    slots: Slots,
    ready: BinaryHeap<ReadyEntry>,
    /// Scheduled entries that originated from a retry (attempt > 0) vs.
    /// a fresh delayed enqueue; both live in the same min-heap but we
    /// track the split for `QueueStats::{scheduled, retry}`.
    scheduled: BinaryHeap<ScheduledEntry>,
    retry_idxs: std::collections::HashSet<usize>,
    active: HashMap<ClaimToken, ActiveEntry>,
    archived: Vec<Job>,
}

/// In-memory `JobQueue`. All methods are `async` to match the trait a
/// durable broker-backed implementation would need (network I/O), even
/// though the in-memory backend never actually awaits.
pub struct JobQueue {
    state: Mutex<State>,
    backoff: BackoffPolicy,
}

impl JobQueue {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            state: Mutex::new(State {
                slots: Slots { jobs: HashMap::new(), next_idx: 0 },
                ready: BinaryHeap::new(),
                scheduled: BinaryHeap::new(),
                retry_idxs: Default::default(),
                active: HashMap::new(),
                archived: Vec::new(),
            }),
            backoff,
        }
    }

    pub async fn enqueue(&self, review_id: ReviewId, priority: i32) {
        let job = Job { review_id, priority, attempt: 0, enqueued_at: Utc::now() };
        let mut state = self.state.lock().await;
        let idx = state.slots.insert(job.clone());
        state.ready.push(ReadyEntry { priority: job.priority, enqueued_at: job.enqueued_at, job_idx: idx });
        info!(review_id = %review_id, priority, "enqueued job");
    }

    /// Promotes any scheduled entries whose `ready_at` has passed into
    /// the ready heap, then pops the highest-priority ready job and
    /// issues a claim token with a visibility-timeout deadline.
    pub async fn claim(&self, visibility_timeout: Duration) -> Option<(ClaimToken, Job)> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        while let Some(top) = state.scheduled.peek() {
            if top.ready_at > now {
                break;
            }
            let entry = state.scheduled.pop().unwrap();
            state.retry_idxs.remove(&entry.job_idx);
            if let Some(job) = state.slots.jobs.get(&entry.job_idx) {
                state.ready.push(ReadyEntry { priority: job.priority, enqueued_at: job.enqueued_at, job_idx: entry.job_idx });
            }
        }

        let entry = state.ready.pop()?;
        let job = state.slots.jobs.remove(&entry.job_idx)?;
        let token = ClaimToken::new();
        let deadline = now + chrono::Duration::from_std(visibility_timeout).unwrap_or(chrono::Duration::seconds(60));
        state.active.insert(token, ActiveEntry { job: job.clone(), deadline });
        Some((token, job))
    }

    pub async fn ack(&self, token: ClaimToken) {
        self.state.lock().await.active.remove(&token);
    }

    /// Nack with reason: schedules a retry with backoff, or archives the
    /// job and the caller should mark its Review failed if the max
    /// attempts threshold is reached.
    pub async fn nack(&self, token: ClaimToken) -> NackOutcome {
        let mut state = self.state.lock().await;
        let Some(entry) = state.active.remove(&token) else {
            return NackOutcome::UnknownToken;
        };
        self.requeue_or_archive(&mut state, entry.job)
    }

    fn requeue_or_archive(&self, state: &mut State, mut job: Job) -> NackOutcome {
        job.attempt += 1;
        if job.attempt >= self.backoff.max_attempts {
            warn!(review_id = %job.review_id, attempt = job.attempt, "max attempts reached, archiving job");
            let archived = job.clone();
            state.archived.push(job);
            return NackOutcome::Archived(archived);
        }
        let delay = self.backoff.delay_for(job.attempt);
        let ready_at = Utc::now() + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::seconds(1));
        let idx = state.slots.insert(job.clone());
        state.retry_idxs.insert(idx);
        state.scheduled.push(ScheduledEntry { ready_at, job_idx: idx });
        NackOutcome::Retrying { attempt: job.attempt, delay }
    }

    /// Sweeps `active` for claims whose visibility-timeout deadline has
    /// passed without an ack, redelivering them (spec.md §4.D point 2).
    /// Returns the number of jobs redelivered. Intended to be driven by
    /// a background task on a short interval.
    pub async fn sweep_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let expired: Vec<ClaimToken> = state
            .active
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(t, _)| *t)
            .collect();
        let mut redelivered = 0;
        for token in expired {
            if let Some(entry) = state.active.remove(&token) {
                self.requeue_or_archive(&mut state, entry.job);
                redelivered += 1;
            }
        }
        redelivered
    }

    pub async fn inspect(&self) -> QueueStats {
        let state = self.state.lock().await;
        let scheduled_total = state.scheduled.len();
        let retry_count = state.retry_idxs.len();
        QueueStats {
            pending: state.ready.len(),
            active: state.active.len(),
            scheduled: scheduled_total - retry_count,
            retry: retry_count,
            archived: state.archived.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NackOutcome {
    Retrying { attempt: u32, delay: Duration },
    Archived(Job),
    UnknownToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn higher_priority_dispatched_first() {
        let q = JobQueue::new(BackoffPolicy::default());
        let low = ReviewId::new();
        let high = ReviewId::new();
        q.enqueue(low, 1).await;
        q.enqueue(high, 100).await;

        let (_, job) = q.claim(Duration::from_secs(30)).await.unwrap();
        assert_eq!(job.review_id, high);
    }

    #[tokio::test]
    async fn nack_past_max_attempts_archives() {
        let q = JobQueue::new(BackoffPolicy { base: Duration::from_millis(1), cap: Duration::from_millis(5), max_attempts: 1 });
        let id = ReviewId::new();
        q.enqueue(id, 1).await;
        let (token, _) = q.claim(Duration::from_secs(30)).await.unwrap();
        let outcome = q.nack(token).await;
        assert!(matches!(outcome, NackOutcome::Archived(_)));
        assert_eq!(q.inspect().await.archived, 1);
    }

    #[tokio::test]
    async fn ack_removes_from_active() {
        let q = JobQueue::new(BackoffPolicy::default());
        let id = ReviewId::new();
        q.enqueue(id, 1).await;
        let (token, _) = q.claim(Duration::from_secs(30)).await.unwrap();
        assert_eq!(q.inspect().await.active, 1);
        q.ack(token).await;
        assert_eq!(q.inspect().await.active, 0);
    }

    #[tokio::test]
    async fn expired_claim_is_redelivered() {
        let q = JobQueue::new(BackoffPolicy { base: Duration::from_millis(1), cap: Duration::from_millis(5), max_attempts: 5 });
        let id = ReviewId::new();
        q.enqueue(id, 1).await;
        let (_token, _job) = q.claim(Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let redelivered = q.sweep_expired().await;
        assert_eq!(redelivered, 1);
        // Goes to scheduled (retry) first because of backoff, not
        // straight back to ready.
        let stats = q.inspect().await;
        assert_eq!(stats.retry, 1);
    }
}
