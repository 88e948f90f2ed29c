//! Small relative-time helpers for tests that assert against a TTL or
//! retention window. Nothing in the workspace injects a `Clock` trait —
//! every crate calls `chrono::Utc::now()` directly — so these are plain
//! arithmetic over `Utc::now()`, not a fake clock a production type can
//! be swapped onto.

use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn minutes_ago(n: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(n)
}

pub fn hours_ago(n: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(n)
}

pub fn days_ago(n: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(n)
}
