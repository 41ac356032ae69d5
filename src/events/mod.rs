//! Wire types of the streaming chat protocol
//!
//! Each non-empty line of a streaming response decodes into one
//! [`StreamEvent`]. The event's [`EventKind`] decides how the accumulator
//! applies it; the kind-specific fields travel either in a nested
//! [`EventPayload`] or flat on the event.
//!
//! ## Usage
//!
//! ```rust
//! use agentmind::events::{EventKind, StreamEvent};
//!
//! let nested = StreamEvent::from_json(r#"{"type":"content","data":{"content":"X"}}"#).unwrap();
//! let flat = StreamEvent::from_json(r#"{"type":"content","content":"X"}"#).unwrap();
//!
//! assert_eq!(nested.kind, EventKind::Content);
//! assert_eq!(nested.content_text(), flat.content_text());
//! ```

mod envelope;
pub(crate) mod extract;
mod kind;
mod payload;

pub use envelope::StreamEvent;
pub use kind::EventKind;
pub use payload::EventPayload;
