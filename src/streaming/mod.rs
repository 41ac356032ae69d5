//! Streaming response accumulation.
//!
//! This module turns the raw body of a streaming chat response into an
//! assistant message: [`LineFramer`] splits bytes into lines, [`decode_line`]
//! turns a line into an event, and [`accumulate`] folds the event into the
//! next [`StreamingMessage`](crate::StreamingMessage) snapshot.

mod accumulator;
mod decoder;
mod framer;

pub use accumulator::{accumulate, Applied, Signal, StreamAccumulator};
pub use decoder::{decode_line, DATA_PREFIX, DONE_SENTINEL};
pub use framer::LineFramer;
