use async_trait::async_trait;
use launchgate_core::errors::Result;
use launchgate_protocol::event::{AppStats, Event, EventQuery, NewEvent, StatsWindow};

/// Persistence boundary for lifecycle events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn record_event(&self, event: NewEvent) -> Result<Event>;

    /// Events matching `query`, newest first.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>>;

    /// Per-application counters over the window, ordered by application name.
    async fn stats(&self, window: StatsWindow) -> Result<Vec<AppStats>>;
}
