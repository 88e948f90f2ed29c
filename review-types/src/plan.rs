//! Per-tenant subscription plan and the admission limits that go with it.
//! Table mirrors spec.md §4.B exactly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Pro,
    Team,
    Enterprise,
}

/// Static per-plan limits. `None` means unlimited.
#[derive(Debug, Clone, Copy)]
pub struct PlanLimits {
    pub max_repos: Option<u32>,
    pub monthly_reviews: Option<u32>,
    pub allows_private: bool,
    pub priority: i32,
}

impl Plan {
    pub const fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                max_repos: Some(3),
                monthly_reviews: Some(50),
                allows_private: false,
                priority: 1,
            },
            Plan::Pro => PlanLimits {
                max_repos: Some(10),
                monthly_reviews: Some(500),
                allows_private: true,
                priority: 1,
            },
            Plan::Team => PlanLimits {
                max_repos: None,
                monthly_reviews: None,
                allows_private: true,
                priority: 50,
            },
            Plan::Enterprise => PlanLimits {
                max_repos: None,
                monthly_reviews: None,
                allows_private: true,
                priority: 100,
            },
        }
    }
}
