//! Nested `data` payload of the current protocol generation

use serde::{Deserialize, Serialize};

/// Kind-specific fields carried in an event's `data` object.
///
/// Every field is optional: which ones are present depends on the event kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// `conversation_id` and `done` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,

    /// `thinking` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// `content` / `text` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// `tool_call` / `tool_result` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// `tool_call` events; either a string or a JSON object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,

    /// `tool_result` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<serde_json::Value>,

    /// `error` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// `error` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl EventPayload {
    /// Payload of a text delta
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    /// Payload of a reasoning delta
    pub fn thinking(text: impl Into<String>) -> Self {
        Self {
            thinking: Some(text.into()),
            ..Self::default()
        }
    }

    /// Payload of a `tool_call` event
    pub fn tool_call(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            tool_name: Some(name.into()),
            tool_input: Some(input),
            ..Self::default()
        }
    }

    /// Payload of a `tool_result` event
    pub fn tool_result(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: Some(name.into()),
            tool_output: Some(serde_json::Value::String(output.into())),
            ..Self::default()
        }
    }

    /// Payload carrying a conversation id
    pub fn conversation(id: i64) -> Self {
        Self {
            conversation_id: Some(id),
            ..Self::default()
        }
    }
}
