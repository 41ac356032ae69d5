//! Event kind discriminator

use serde::{Deserialize, Serialize};

/// The `type` field of a streamed event.
///
/// Kinds this client does not know are preserved as [`EventKind::Unknown`] so
/// that newer backends can introduce events without breaking older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Backend created or resolved the conversation
    ConversationId,
    /// Reasoning trace delta
    Thinking,
    /// Answer text delta (older backends)
    Content,
    /// Answer text delta (newer backends)
    Text,
    /// A tool invocation started
    ToolCall,
    /// A tool invocation finished
    ToolResult,
    /// Legacy combined tool event carrying a full `tool_info`
    Tool,
    /// Terminal event, also produced by the `[DONE]` sentinel
    Done,
    /// The backend failed the request
    Error,
    /// Anything else
    Unknown(String),
}

impl EventKind {
    /// Parse a wire kind string
    pub fn parse(kind: &str) -> Self {
        match kind {
            "conversation_id" => Self::ConversationId,
            "thinking" => Self::Thinking,
            "content" => Self::Content,
            "text" => Self::Text,
            "tool_call" => Self::ToolCall,
            "tool_result" => Self::ToolResult,
            "tool" => Self::Tool,
            "done" => Self::Done,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConversationId => "conversation_id",
            Self::Thinking => "thinking",
            Self::Content => "content",
            Self::Text => "text",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::Tool => "tool",
            Self::Done => "done",
            Self::Error => "error",
            Self::Unknown(other) => other,
        }
    }

    /// `done` or `error`: nothing after this event belongs to the message
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        Self::parse(&kind)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
