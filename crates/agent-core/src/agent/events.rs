use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of the output protocol delivered to a front end.
///
/// Every turn produces exactly one terminal event: [`StreamEvent::Done`] or
/// [`StreamEvent::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Content {
        content: String,
    },

    ToolCall {
        tool: String,
        parameters: serde_json::Value,
    },

    ToolResult {
        tool: String,
        result: serde_json::Value,
    },

    ToolError {
        tool: String,
        error: String,
    },

    /// Transport-level failure; aborts the turn.
    Error {
        error: String,
    },

    /// End of stream.
    Done,
}

impl StreamEvent {
    pub fn content(content: impl Into<String>) -> Self {
        StreamEvent::Content {
            content: content.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

/// A [`StreamEvent`] stamped with the moment it was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: StreamEvent,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn now(event: StreamEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.event.is_terminal()
    }
}

impl From<StreamEvent> for EventEnvelope {
    fn from(event: StreamEvent) -> Self {
        Self::now(event)
    }
}
