//! Shared data model for the review orchestration core.
//!
//! Every other crate in the workspace depends on this one for the handful of
//! cross-cutting types (`Organization`, `Repository`, `Review`, `Finding`,
//! chunk fingerprints, cache entries, feedback records) so that no crate
//! needs to reach into another crate's internals just to pass a record
//! around.

pub mod feedback;
pub mod finding;
pub mod ids;
pub mod org;
pub mod plan;
pub mod platform;
pub mod repo;
pub mod review;
pub mod token;
pub mod trigger;

pub use feedback::{FeedbackDecision, FeedbackRecord};
pub use finding::{Finding, Severity};
pub use ids::{OrgId, RepoId, ReviewId};
pub use org::Organization;
pub use plan::Plan;
pub use platform::Platform;
pub use repo::Repository;
pub use review::{Review, ReviewStatus};
pub use token::InstallationToken;
pub use trigger::ReviewTrigger;
