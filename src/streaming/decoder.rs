//! Line to event decoding.

use crate::events::StreamEvent;

/// Prefix of SSE data lines
pub const DATA_PREFIX: &str = "data:";

/// Payload that terminates a stream without a JSON `done` event
pub const DONE_SENTINEL: &str = "[DONE]";

/// SSE fields other than `data` carry nothing this client uses
const IGNORED_FIELDS: &[&str] = &["event:", "id:", "retry:"];

/// Decode one line of a streaming response.
///
/// * blank lines yield nothing
/// * `data: [DONE]` yields a `done` event with no payload
/// * `data: {...}` is parsed as an event
/// * other SSE fields and `:` comments are skipped
/// * anything else is tried as bare JSON, which older backends emitted
///
/// Malformed JSON is logged and skipped; it never ends the stream.
pub fn decode_line(line: &str) -> Option<StreamEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix(DATA_PREFIX) {
        let payload = rest.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == DONE_SENTINEL {
            return Some(StreamEvent::done());
        }
        return match StreamEvent::from_json(payload) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(error = %err, payload, "failed to parse SSE data line");
                None
            }
        };
    }

    if trimmed.starts_with(':') || IGNORED_FIELDS.iter().any(|field| trimmed.starts_with(field)) {
        return None;
    }

    match StreamEvent::from_json(trimmed) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::debug!(error = %err, line = trimmed, "ignoring non-JSON line without data prefix");
            None
        }
    }
}
