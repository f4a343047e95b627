//! Change-feed events
//!
//! Serialized as one JSON object per SSE `data:` line. The `type` tag and
//! field names are the wire contract consumed by browser clients.

use serde::{Deserialize, Serialize};

/// Message sent to clients when a tick fails
pub const POLL_FAILED: &str = "poll_failed";

/// Event emitted on a change stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangeEvent {
    /// First event of every stream, carrying the version at open time
    Init { version: i64, now: i64 },
    /// Version differs from the last one emitted on this stream
    Update { version: i64, at: i64 },
    /// Tick completed and nothing changed
    Heartbeat { at: i64 },
    /// Tick failed; the stream stays open
    Error { message: String },
}

impl ChangeEvent {
    /// Get event type as string for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeEvent::Init { .. } => "init",
            ChangeEvent::Update { .. } => "update",
            ChangeEvent::Heartbeat { .. } => "heartbeat",
            ChangeEvent::Error { .. } => "error",
        }
    }

    pub fn poll_failed() -> Self {
        ChangeEvent::Error {
            message: POLL_FAILED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_value(ChangeEvent::Init { version: 7, now: 9 }).unwrap(),
            json!({"type": "init", "version": 7, "now": 9})
        );
        assert_eq!(
            serde_json::to_value(ChangeEvent::Update { version: 8, at: 10 }).unwrap(),
            json!({"type": "update", "version": 8, "at": 10})
        );
        assert_eq!(
            serde_json::to_value(ChangeEvent::Heartbeat { at: 11 }).unwrap(),
            json!({"type": "heartbeat", "at": 11})
        );
        assert_eq!(
            serde_json::to_value(ChangeEvent::poll_failed()).unwrap(),
            json!({"type": "error", "message": "poll_failed"})
        );
    }

    #[test]
    fn test_event_type_matches_tag() {
        let events = [
            ChangeEvent::Init { version: 1, now: 1 },
            ChangeEvent::Update { version: 2, at: 2 },
            ChangeEvent::Heartbeat { at: 3 },
            ChangeEvent::poll_failed(),
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }
}
