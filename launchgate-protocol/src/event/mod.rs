mod entry;
mod query;
mod stats;

pub use entry::{Event, EventType, NewEvent, ParseEventTypeError};
pub use query::EventQuery;
pub use stats::{AppStats, StatsWindow};
