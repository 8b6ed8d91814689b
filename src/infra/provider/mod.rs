pub mod fixtures;

use crate::domain::models::TrackedLocation;
use chrono::{DateTime, Utc};

/// Answers "track bus/route by identifier" queries.
pub trait LocationProvider {
    fn track(&self, query: &str, now: DateTime<Utc>) -> Option<TrackedLocation>;
}
