//! One decoded line of the response stream

use super::extract;
use super::{EventKind, EventPayload};
use crate::ToolStep;
use serde::{Deserialize, Serialize};

/// A streamed event in either protocol shape.
///
/// The current shape nests kind-specific fields under `data`:
///
/// ```json
/// {"type": "tool_call", "data": {"tool_name": "calc", "tool_input": {"x": 1}}, "timestamp": "..."}
/// ```
///
/// The legacy shape puts them on the event itself:
///
/// ```json
/// {"type": "content", "content": "Hi", "conversation_id": 7}
/// ```
///
/// Use the accessor methods rather than the raw fields; they apply the
/// nested-then-flat fallback for each field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Event kind
    #[serde(rename = "type", default)]
    pub kind: EventKind,

    /// Nested payload (current protocol)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventPayload>,

    /// Server-side event time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Flat text delta (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Flat reasoning delta (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Flat conversation id (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,

    /// Full tool step (legacy `tool` and `tool_call` events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_info: Option<ToolStep>,

    /// Flat error message (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Flat error code (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl StreamEvent {
    /// A bare event of the given kind
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// An event in the current, nested shape
    pub fn nested(kind: EventKind, data: EventPayload) -> Self {
        Self {
            kind,
            data: Some(data),
            ..Self::default()
        }
    }

    /// The terminal event produced by the `[DONE]` sentinel
    pub fn done() -> Self {
        Self::new(EventKind::Done)
    }

    /// Set the server-side timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Parse a JSON payload (the text after `data: `)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize back to a single JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn conversation_id(&self) -> Option<i64> {
        extract::CONVERSATION_ID.iter().find_map(|f| f(self))
    }

    pub fn thinking_text(&self) -> Option<&str> {
        extract::THINKING.iter().find_map(|f| f(self))
    }

    pub fn content_text(&self) -> Option<&str> {
        extract::CONTENT.iter().find_map(|f| f(self))
    }

    pub fn tool_name(&self) -> Option<&str> {
        extract::TOOL_NAME.iter().find_map(|f| f(self))
    }

    /// Tool input, JSON-serialized when the backend sent an object
    pub fn tool_input(&self) -> Option<String> {
        extract::TOOL_INPUT.iter().find_map(|f| f(self))
    }

    /// Tool output, JSON-serialized when the backend sent an object
    pub fn tool_output(&self) -> Option<String> {
        extract::TOOL_OUTPUT.iter().find_map(|f| f(self))
    }

    pub fn error_message(&self) -> Option<&str> {
        extract::ERROR_MESSAGE.iter().find_map(|f| f(self))
    }

    pub fn error_code(&self) -> Option<&str> {
        extract::ERROR_CODE.iter().find_map(|f| f(self))
    }
}
