use serde::{Deserialize, Serialize};

use super::EventType;

/// Client-facing filters for event listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventQuery {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub event_type: Option<EventType>,
}
