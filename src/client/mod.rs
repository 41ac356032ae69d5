//! HTTP side of the chat client
//!
//! [`StreamClient`] posts a [`ChatRequest`] to the streaming endpoint and
//! drives the response body through the [`streaming`](crate::streaming)
//! pipeline. [`ConversationsApi`] covers the REST endpoints for stored
//! conversations.

mod config;
mod conversations;
mod driver;
mod request;

pub use config::{
    ClientConfig, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_STREAM_PATH,
    DEFAULT_TIMEOUT, TIMEOUT_ENV,
};
pub use conversations::{Conversation, ConversationDetail, ConversationsApi, StoredMessage, DEFAULT_PAGE_SIZE};
pub use driver::{pump_stream, NoopObserver, StreamClient, StreamObserver};
pub use request::{ChatRequest, ChatStreamBody, LlmConfig};
