use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle signal reported by a client application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Start,
    Stop,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Start => "start",
            EventType::Stop => "stop",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEventTypeError(pub String);

impl fmt::Display for ParseEventTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for ParseEventTypeError {}

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start" => Ok(EventType::Start),
            "stop" => Ok(EventType::Stop),
            other => Err(ParseEventTypeError(other.to_string())),
        }
    }
}

/// Event as persisted by an event store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub app: String,
    pub version: String,
    pub event_type: EventType,
    pub client_ip: String,
    pub created_at: DateTime<Utc>,
}

/// Event about to be recorded; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub app: String,
    pub version: String,
    pub event_type: EventType,
    pub client_ip: String,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn now(
        event_type: EventType,
        app: impl Into<String>,
        version: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self {
            app: app.into(),
            version: version.into(),
            event_type,
            client_ip: client_ip.into(),
            created_at: Utc::now(),
        }
    }

    pub fn start(
        app: impl Into<String>,
        version: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self::now(EventType::Start, app, version, client_ip)
    }

    pub fn stop(
        app: impl Into<String>,
        version: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self::now(EventType::Stop, app, version, client_ip)
    }
}
