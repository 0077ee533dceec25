use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-application lifecycle counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppStats {
    pub app: String,
    pub start_count: u64,
    pub stop_count: u64,
    /// Distinct client addresses across start and stop events.
    pub unique_ips: u64,
}

/// Inclusive time window applied to statistics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}
