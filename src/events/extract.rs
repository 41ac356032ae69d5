//! Field fallback chains.
//!
//! Each field of a [`StreamEvent`] can arrive in the nested `data` payload
//! (current protocol) or flat on the event (legacy protocol). Every chain below
//! lists its extractors in priority order; the first one that yields a value
//! wins, so a nested value always shadows a flat one.

use super::StreamEvent;

pub(crate) type IdExtractor = fn(&StreamEvent) -> Option<i64>;
pub(crate) type TextExtractor = fn(&StreamEvent) -> Option<&str>;
pub(crate) type OwnedExtractor = fn(&StreamEvent) -> Option<String>;

pub(crate) const CONVERSATION_ID: &[IdExtractor] = &[nested_conversation_id, flat_conversation_id];

// Legacy backends sent reasoning deltas in the flat `content` field.
pub(crate) const THINKING: &[TextExtractor] = &[nested_thinking, flat_thinking, flat_content];

pub(crate) const CONTENT: &[TextExtractor] = &[nested_content, flat_content];

pub(crate) const TOOL_NAME: &[TextExtractor] = &[nested_tool_name, tool_info_name];

pub(crate) const TOOL_INPUT: &[OwnedExtractor] = &[nested_tool_input, tool_info_input];

pub(crate) const TOOL_OUTPUT: &[OwnedExtractor] = &[nested_tool_output, tool_info_output];

pub(crate) const ERROR_MESSAGE: &[TextExtractor] = &[nested_message, flat_message];

pub(crate) const ERROR_CODE: &[TextExtractor] = &[nested_code, flat_code];

fn nested_conversation_id(event: &StreamEvent) -> Option<i64> {
    event.data.as_ref()?.conversation_id
}

fn flat_conversation_id(event: &StreamEvent) -> Option<i64> {
    event.conversation_id
}

fn nested_thinking(event: &StreamEvent) -> Option<&str> {
    event.data.as_ref()?.thinking.as_deref()
}

fn flat_thinking(event: &StreamEvent) -> Option<&str> {
    event.thinking.as_deref()
}

fn nested_content(event: &StreamEvent) -> Option<&str> {
    event.data.as_ref()?.content.as_deref()
}

fn flat_content(event: &StreamEvent) -> Option<&str> {
    event.content.as_deref()
}

fn nested_tool_name(event: &StreamEvent) -> Option<&str> {
    event.data.as_ref()?.tool_name.as_deref()
}

fn tool_info_name(event: &StreamEvent) -> Option<&str> {
    event.tool_info.as_ref().map(|info| info.tool.as_str())
}

fn nested_tool_input(event: &StreamEvent) -> Option<String> {
    event.data.as_ref()?.tool_input.as_ref().map(stringify)
}

fn tool_info_input(event: &StreamEvent) -> Option<String> {
    event.tool_info.as_ref().map(|info| info.input.clone())
}

fn nested_tool_output(event: &StreamEvent) -> Option<String> {
    event.data.as_ref()?.tool_output.as_ref().map(stringify)
}

fn tool_info_output(event: &StreamEvent) -> Option<String> {
    event.tool_info.as_ref().map(|info| info.output.clone())
}

fn nested_message(event: &StreamEvent) -> Option<&str> {
    event.data.as_ref()?.message.as_deref()
}

fn flat_message(event: &StreamEvent) -> Option<&str> {
    event.message.as_deref()
}

fn nested_code(event: &StreamEvent) -> Option<&str> {
    event.data.as_ref()?.code.as_deref()
}

fn flat_code(event: &StreamEvent) -> Option<&str> {
    event.code.as_deref()
}

/// Strings are stored as-is, anything else as compact JSON
pub(crate) fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
