//! AgentMind streaming chat client
//!
//! This crate consumes the AgentMind backend's streaming chat endpoint and folds
//! the Server-Sent-Events it emits into an in-progress assistant message that a
//! UI can re-render after every event.
//!
//! The backend has shipped two generations of its event protocol. Newer builds
//! wrap every field in a nested `data` object, older builds send the same fields
//! flat on the event. Both are accepted everywhere.
//!
//! ## Layers
//!
//! 1. [`streaming::LineFramer`] turns arbitrary byte chunks into lines
//! 2. [`streaming::decode_line`] turns one line into an optional [`events::StreamEvent`]
//! 3. [`streaming::accumulate`] applies one event to a [`StreamingMessage`] snapshot
//! 4. [`client::StreamClient`] drives the HTTP request through the three steps above
//! 5. [`session::ChatSession`] wraps the driver in an observable state machine
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agentmind::client::{ChatRequest, ClientConfig, StreamClient};
//! use agentmind::client::NoopObserver;
//!
//! # async fn run() -> Result<(), agentmind::ChatError> {
//! let client = StreamClient::new(ClientConfig::default())?;
//! let request = ChatRequest::new("What is 2 + 2?").with_plan_mode(false);
//!
//! let message = client.stream_chat(&request, &mut NoopObserver).await?;
//! println!("{}", message.content);
//! # Ok(())
//! # }
//! ```
//!
//! Decoding and accumulation can also be used without any networking:
//!
//! ```rust
//! use agentmind::streaming::{decode_line, StreamAccumulator};
//!
//! let mut acc = StreamAccumulator::new();
//! for line in [
//!     r#"data: {"type":"thinking","data":{"thinking":"Hmm"}}"#,
//!     r#"data: {"type":"content","content":"Hi"}"#,
//!     "data: [DONE]",
//! ] {
//!     if let Some(event) = decode_line(line) {
//!         acc.apply(&event);
//!     }
//! }
//!
//! let message = acc.into_message();
//! assert_eq!(message.thinking, "Hmm");
//! assert_eq!(message.content, "Hi");
//! assert!(message.is_complete);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

pub mod client;
pub mod error;
pub mod events;
pub mod preferences;
pub mod session;
pub mod streaming;

pub use error::{ChatError, StreamFailure};
pub use events::{EventKind, EventPayload, StreamEvent};
pub use streaming::{accumulate, decode_line, Applied, LineFramer, Signal, StreamAccumulator};

// ============================================================================
// Core Message Types
// ============================================================================

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Assistant response
    Assistant,
    /// System-level instructions
    System,
}

impl MessageRole {
    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tool invocation shown alongside an assistant message.
///
/// This is the `tool_info` object of the legacy protocol and the element type
/// of a stored message's `intermediate_steps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStep {
    /// Tool name (e.g. "web_search", "knowledge_retrieval")
    #[serde(default)]
    pub tool: String,
    /// Tool input, stringified
    #[serde(default, deserialize_with = "text_or_json")]
    pub input: String,
    /// Tool output, empty until the matching result arrives
    #[serde(default, deserialize_with = "text_or_json")]
    pub output: String,
    /// Invocation time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ToolStep {
    /// Create a step that has not produced output yet
    pub fn pending(tool: impl Into<String>, input: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            input: input.into(),
            output: String::new(),
            timestamp: Some(timestamp.into()),
        }
    }
}

/// A string as is, any other JSON value as its compact text, `null` as empty
fn text_or_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(events::extract::stringify).unwrap_or_default())
}

/// The assistant message being built from a response stream.
///
/// `content` and `thinking` only ever grow while a single response is being
/// accumulated. `tool_steps` keeps the arrival order of `tool_call` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingMessage {
    /// Conversation the backend attached this response to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    /// Always [`MessageRole::Assistant`]
    pub role: MessageRole,
    /// Accumulated answer text
    pub content: String,
    /// Accumulated reasoning trace
    pub thinking: String,
    /// Tool invocations in call order
    #[serde(rename = "intermediate_steps")]
    pub tool_steps: Vec<ToolStep>,
    /// Set once the terminal `done` event has been applied
    pub is_complete: bool,
}

impl StreamingMessage {
    /// An empty assistant message, the starting point of every response
    pub fn new() -> Self {
        Self {
            conversation_id: None,
            role: MessageRole::Assistant,
            content: String::new(),
            thinking: String::new(),
            tool_steps: Vec::new(),
            is_complete: false,
        }
    }

    /// True if nothing has been accumulated yet
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.thinking.is_empty() && self.tool_steps.is_empty()
    }
}

impl Default for StreamingMessage {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
