//! Job Store (spec.md §4.C) and the rest of the §6 persisted schema.
//!
//! Ships an in-memory reference implementation behind plain structs
//! (rather than a trait-object store) since the core only ever needs one
//! concrete backend per process; a Postgres-backed version would expose
//! the same methods. `Store` composes the per-table stores the way a
//! connection pool would hand out repositories for each aggregate.

pub mod errors;
pub mod feedback_store;
pub mod org_store;
pub mod repo_store;
pub mod review_store;
pub mod tables;

pub use errors::{Result, StoreError};
pub use feedback_store::{FeedbackDistribution, FeedbackStore};
pub use org_store::OrganizationStore;
pub use repo_store::RepositoryStore;
pub use review_store::ReviewStore;

/// Every per-table store the core needs, composed behind one handle that
/// `review-api`/`review-worker` hold in their shared state.
#[derive(Default)]
pub struct Store {
    pub organizations: OrganizationStore,
    pub repositories: RepositoryStore,
    pub reviews: ReviewStore,
    pub feedback: FeedbackStore,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}
