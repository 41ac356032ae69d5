//! Streaming response accumulator.

use crate::error::{now_rfc3339, StreamFailure, DEFAULT_FAILURE_MESSAGE, STREAM_ERROR};
use crate::events::{EventKind, StreamEvent};
use crate::{StreamingMessage, ToolStep};

/// What the caller should do after an event has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Keep reading
    Continue,
    /// `done` was applied; stop reading and deliver the message
    Complete,
    /// The backend failed the request; discard the message
    Failed(StreamFailure),
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The next snapshot
    pub message: StreamingMessage,
    /// Lifecycle signal for the caller
    pub signal: Signal,
}

/// Apply `event` to `previous` and return the next snapshot.
///
/// `previous` is left untouched, so every application yields a distinct value
/// a UI can compare against the last one it rendered.
pub fn accumulate(previous: &StreamingMessage, event: &StreamEvent) -> Applied {
    let mut message = previous.clone();

    let signal = match &event.kind {
        EventKind::ConversationId => {
            if let Some(id) = event.conversation_id() {
                message.conversation_id = Some(id);
            }
            Signal::Continue
        }
        EventKind::Thinking => {
            if let Some(text) = event.thinking_text() {
                message.thinking.push_str(text);
            }
            Signal::Continue
        }
        EventKind::Content | EventKind::Text => {
            if let Some(text) = event.content_text() {
                message.content.push_str(text);
            }
            Signal::Continue
        }
        EventKind::ToolCall => {
            if event.data.is_some() {
                let timestamp = event.timestamp.clone().unwrap_or_else(now_rfc3339);
                message.tool_steps.push(ToolStep::pending(
                    event.tool_name().unwrap_or_default(),
                    event.tool_input().unwrap_or_default(),
                    timestamp,
                ));
            } else if let Some(info) = &event.tool_info {
                message.tool_steps.push(info.clone());
            }
            Signal::Continue
        }
        EventKind::Tool => {
            if let Some(info) = &event.tool_info {
                message.tool_steps.push(info.clone());
            }
            Signal::Continue
        }
        EventKind::ToolResult => {
            match event.tool_name() {
                // Latest call wins when the same tool ran more than once.
                Some(name) => match message.tool_steps.iter_mut().rev().find(|step| step.tool == name) {
                    Some(step) => step.output = event.tool_output().unwrap_or_default(),
                    None => tracing::debug!(tool = name, "tool_result without matching tool_call"),
                },
                None => tracing::debug!("tool_result without tool name"),
            }
            Signal::Continue
        }
        EventKind::Done => {
            message.is_complete = true;
            if let Some(id) = event.conversation_id() {
                message.conversation_id = Some(id);
            }
            Signal::Complete
        }
        EventKind::Error => Signal::Failed(StreamFailure::new(
            event.error_message().unwrap_or(DEFAULT_FAILURE_MESSAGE),
            event.error_code().unwrap_or(STREAM_ERROR),
        )),
        EventKind::Unknown(kind) => {
            tracing::warn!(kind = %kind, "unknown stream event kind");
            Signal::Continue
        }
    };

    Applied { message, signal }
}

/// Owns the snapshot of one response while it streams.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    message: StreamingMessage,
    applied: usize,
}

impl StreamAccumulator {
    /// Create an accumulator holding an empty assistant message
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    ///
    /// Once `done` has been applied the message is final: later events are
    /// ignored and `Complete` is returned again.
    pub fn apply(&mut self, event: &StreamEvent) -> Signal {
        if self.message.is_complete {
            tracing::debug!(kind = %event.kind, "ignoring event after done");
            return Signal::Complete;
        }

        let Applied { message, signal } = accumulate(&self.message, event);
        self.message = message;
        self.applied += 1;
        signal
    }

    /// The current snapshot
    pub fn snapshot(&self) -> &StreamingMessage {
        &self.message
    }

    /// Whether `done` has been applied
    pub fn is_complete(&self) -> bool {
        self.message.is_complete
    }

    /// Number of events applied so far
    pub fn events_applied(&self) -> usize {
        self.applied
    }

    /// Take the accumulated message
    pub fn into_message(self) -> StreamingMessage {
        self.message
    }

    /// Accumulate an entire event stream into a message
    ///
    /// This is a convenience method for callers that do not need per-event
    /// snapshots. It stops at the first `done` and turns an `error` event into
    /// `Err`.
    pub fn accumulate_all<'a, I>(events: I) -> Result<StreamingMessage, StreamFailure>
    where
        I: IntoIterator<Item = &'a StreamEvent>,
    {
        let mut accumulator = Self::new();

        for event in events {
            match accumulator.apply(event) {
                Signal::Continue => {}
                Signal::Complete => break,
                Signal::Failed(failure) => return Err(failure),
            }
        }

        Ok(accumulator.into_message())
    }
}
