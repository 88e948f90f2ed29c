//! Shared state for every axum handler in this crate. Generalizes the
//! teacher's `AppState { gitlab_api_base, gitlab_token, trigger_secret }`
//! from a single provider's trigger endpoint into the full set of
//! long-lived handles the core's HTTP surface needs: config, the Job
//! Store, the Priority Queue, the Admission Controller's dependencies,
//! and the Metrics Sink.
//!
//! `review-worker`'s pipeline runs in a separate task (the worker pool),
//! so `AppState` only needs what Event Intake and the management routes
//! touch directly — it does not hold a `Workspace`/`FindingCache`/
//! `ForgeResolver`.

use std::sync::Arc;

use review_config::Config;
use review_metrics::Metrics;
use review_queue::JobQueue;
use review_store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub queue: Arc<JobQueue>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<Store>, queue: Arc<JobQueue>, metrics: Arc<Metrics>) -> Self {
        Self { config, store, queue, metrics }
    }
}
