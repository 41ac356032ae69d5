//! Error types

use serde::{Deserialize, Serialize};

/// Code attached to HTTP and transport failures
pub const REQUEST_ERROR: &str = "REQUEST_ERROR";

/// Code attached to `error` events that do not carry their own
pub const STREAM_ERROR: &str = "STREAM_ERROR";

/// Message used when an `error` event does not carry one
pub const DEFAULT_FAILURE_MESSAGE: &str = "stream failed";

/// Errors from the chat client.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The streaming endpoint answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// Response status
        status: reqwest::StatusCode,
        /// Response body, read as text for diagnostics
        body: String,
    },
    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend sent an `error` event.
    #[error("server error [{}]: {}", .0.code, .0.message)]
    Server(StreamFailure),
    /// A response is already streaming for this session.
    #[error("a message is already being streamed")]
    SendInProgress,
    /// A REST response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Preference storage failed.
    #[error("preferences error: {0}")]
    Preferences(String),
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// The structured failure an observer or session publishes for this error
    pub fn to_failure(&self) -> StreamFailure {
        match self {
            Self::Server(failure) => failure.clone(),
            other => StreamFailure::new(other.to_string(), REQUEST_ERROR),
        }
    }
}

/// A fatal request failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFailure {
    /// Human-readable description
    pub message: String,
    /// Machine-readable code
    pub code: String,
    /// When the failure was observed (RFC 3339)
    pub timestamp: String,
}

impl StreamFailure {
    /// Create a failure stamped with the current time
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            timestamp: now_rfc3339(),
        }
    }
}

/// Current time in the format the backend uses for event timestamps
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
