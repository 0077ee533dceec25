pub mod api;
pub mod event;

pub mod prelude {
    pub use crate::api::{ApiError, ApiResponse};
    pub use crate::event::{AppStats, Event, EventQuery, EventType, NewEvent, StatsWindow};
}
