//! Worker Pool (spec.md §4.E): claims jobs off the Priority Queue and
//! drives each through the full review pipeline, bounded by a fixed
//! number of concurrent permits with cooperative cancellation and a
//! graceful drain on shutdown.
//!
//! The teacher doesn't carry `tokio-util`, so cancellation is plain
//! `tokio`: an `Arc<AtomicBool>` flag plus a `Notify` stand in for what
//! a `CancellationToken` would give for free, which is the idiomatic
//! choice available without adding a dependency the rest of the
//! workspace doesn't already use.

pub mod errors;
pub mod forge_resolver;
pub mod pipeline;

pub use errors::PipelineError;
pub use forge_resolver::ForgeResolver;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use review_cache::InMemoryFindingCache;
use review_config::Config;
use review_metrics::Metrics;
use review_queue::{JobQueue, NackOutcome};
use review_store::Store;
use review_workspace::Workspace;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::pipeline::PipelineContext;

/// Every long-lived handle a job needs, shared across all workers. Held
/// behind `Arc`s so spawned per-job tasks can each clone the handles
/// they need without borrowing from the pool.
pub struct WorkerState {
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub workspace: Arc<Workspace>,
    pub cache: Arc<InMemoryFindingCache>,
    pub metrics: Arc<Metrics>,
    pub queue: Arc<JobQueue>,
    pub forge: Arc<ForgeResolver>,
    pub http: reqwest::Client,
}

pub struct WorkerPool {
    state: WorkerState,
    permits: Arc<Semaphore>,
    visibility_timeout: Duration,
    review_timeout: Duration,
    drain_deadline: Duration,
    shutting_down: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl WorkerPool {
    pub fn new(state: WorkerState, pool_size: usize, visibility_timeout: Duration, drain_deadline: Duration) -> Self {
        let review_timeout = Duration::from_millis(state.config.review_timeout_ms);
        Self {
            state,
            permits: Arc::new(Semaphore::new(pool_size)),
            visibility_timeout,
            review_timeout,
            drain_deadline,
            shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signals every in-flight worker to finish its current job and stop
    /// claiming new ones. Call [`Self::run`]'s returned `JoinHandle`-less
    /// drain loop to wait up to `drain_deadline` for that to happen.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    /// Runs the claim loop until `shutdown` is called, then waits up to
    /// `drain_deadline` for in-flight jobs before returning. Intended to
    /// be the body of a `tokio::spawn`ed supervisor task held by the
    /// caller for the life of the process.
    #[instrument(skip(self))]
    pub async fn run(self: Arc<Self>) {
        let mut in_flight = JoinSet::new();

        loop {
            if self.shutting_down.load(Ordering::SeqCst) {
                break;
            }

            let Some(permit) = self.permits.clone().try_acquire_owned().ok() else {
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            };

            let Some((token, job)) = self.state.queue.claim(self.visibility_timeout).await else {
                drop(permit);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                    _ = self.shutdown.notified() => break,
                }
                continue;
            };

            let pool = self.clone();
            in_flight.spawn(async move {
                let _permit = permit;
                pool.run_one(token, job).await;
            });

            // Reap finished tasks opportunistically so the set doesn't
            // grow unbounded across a long-running process.
            while in_flight.try_join_next().is_some() {}
        }

        info!(in_flight = in_flight.len(), "worker pool draining");
        let drained = tokio::time::timeout(self.drain_deadline, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = in_flight.len(), "drain deadline exceeded, aborting remaining jobs");
            in_flight.shutdown().await;
        }
    }

    async fn run_one(&self, token: review_queue::ClaimToken, job: review_queue::Job) {
        let started = std::time::Instant::now();

        let outcome = self.try_run(job.review_id).await;

        match outcome {
            Ok(()) => self.state.queue.ack(token).await,
            Err(e) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                if let Some(review) = self.state.store.reviews.get(job.review_id).await.ok().flatten() {
                    pipeline::record_failure(&self.context(), &review, &e, duration_ms).await;
                }
                if e.is_retryable() {
                    match self.state.queue.nack(token).await {
                        NackOutcome::Archived(_) => {
                            warn!(review_id = %job.review_id, "job archived after exhausting retries");
                        }
                        NackOutcome::Retrying { attempt, delay } => {
                            info!(review_id = %job.review_id, attempt, ?delay, "job will retry");
                        }
                        NackOutcome::UnknownToken => {}
                    }
                } else {
                    // Permanent failure: don't retry, just drop the claim.
                    self.state.queue.ack(token).await;
                }
            }
        }
    }

    fn context(&self) -> PipelineContext<'_> {
        PipelineContext {
            config: self.state.config.as_ref(),
            store: self.state.store.as_ref(),
            workspace: self.state.workspace.as_ref(),
            cache: self.state.cache.as_ref(),
            metrics: self.state.metrics.as_ref(),
            forge: self.state.forge.as_ref(),
            http: &self.state.http,
        }
    }

    async fn try_run(&self, review_id: review_types::ReviewId) -> Result<(), PipelineError> {
        let review = self
            .state
            .store
            .reviews
            .get(review_id)
            .await?
            .ok_or_else(|| review_store::StoreError::NotFound(review_id.to_string()))?;

        if !self.state.store.reviews.claim_for_processing(review.id).await? {
            // Already claimed by another delivery of the same message, or
            // already terminal; nothing to do.
            return Ok(());
        }

        let repo = self
            .state
            .store
            .repositories
            .get(review.repo_id)
            .await?
            .ok_or_else(|| review_store::StoreError::NotFound(review.repo_id.to_string()))?;
        let org = self
            .state
            .store
            .organizations
            .get(review.org_id)
            .await
            .ok_or_else(|| review_store::StoreError::NotFound(review.org_id.to_string()))?;

        let ctx = self.context();
        let pipeline_future = pipeline::run(&ctx, &review, &repo, &org);

        tokio::select! {
            result = pipeline_future => result.map(|_| ()),
            _ = tokio::time::sleep(self.review_timeout) => Err(PipelineError::Timeout),
            _ = self.shutdown.notified() => Err(PipelineError::Cancelled),
        }
    }
}
