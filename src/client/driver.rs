//! Streaming chat driver.
//!
//! Posts a [`ChatRequest`], then pumps the response body through
//! [`LineFramer`] → [`decode_line`] → [`StreamAccumulator`] in arrival order,
//! reporting every snapshot to a [`StreamObserver`].

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use tracing::Instrument;
use ulid::Ulid;

use super::{ChatRequest, ClientConfig, ConversationsApi};
use crate::error::{ChatError, StreamFailure};
use crate::streaming::{decode_line, LineFramer, Signal, StreamAccumulator};
use crate::StreamingMessage;

/// Receives progress of one streamed response.
///
/// `on_complete` and `on_error` are mutually exclusive and each fires at most
/// once per request.
pub trait StreamObserver {
    /// A new snapshot after one applied event
    fn on_update(&mut self, message: &StreamingMessage) {
        let _ = message;
    }

    /// The terminal `done` event arrived
    fn on_complete(&mut self, message: &StreamingMessage) {
        let _ = message;
    }

    /// The request failed; the partial message must not be shown as final
    fn on_error(&mut self, failure: &StreamFailure) {
        let _ = failure;
    }
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}

/// HTTP client for the streaming chat endpoint
#[derive(Debug, Clone)]
pub struct StreamClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl StreamClient {
    /// Build a client with its own connection pool
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Build a client around an existing `reqwest::Client`
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// REST access to stored conversations, sharing this client's pool
    pub fn conversations(&self) -> ConversationsApi<'_> {
        ConversationsApi::new(&self.config, &self.http)
    }

    /// Send `request` and stream the assistant's answer.
    ///
    /// Returns the final message once `done` arrives. If the body ends without
    /// `done`, the partial message is returned with `is_complete == false` and
    /// `on_complete` is not called. Every failure is reported to
    /// `observer.on_error` before it is returned. Nothing is retried.
    pub async fn stream_chat<O>(
        &self,
        request: &ChatRequest,
        observer: &mut O,
    ) -> Result<StreamingMessage, ChatError>
    where
        O: StreamObserver + ?Sized,
    {
        let request_id = Ulid::new();
        let span = tracing::info_span!("stream_chat", %request_id);

        async move {
            let result = self.send_and_pump(request, observer).await;
            if let Err(err) = &result {
                tracing::debug!(error = %err, "streaming chat request failed");
                observer.on_error(&err.to_failure());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn send_and_pump<O>(
        &self,
        request: &ChatRequest,
        observer: &mut O,
    ) -> Result<StreamingMessage, ChatError>
    where
        O: StreamObserver + ?Sized,
    {
        let url = self.config.stream_url();
        let body = request.to_body();

        tracing::debug!(url = %url, conversation_id = ?body.conversation_id, "sending streaming chat request");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Http { status, body });
        }

        pump_stream(response.bytes_stream(), observer).await
    }
}

/// Drive a chunked body through framing, decoding and accumulation.
///
/// Stops reading as soon as `done` is applied. An `error` event becomes
/// [`ChatError::Server`]; a failed read is converted through `From`.
pub async fn pump_stream<S, B, E, O>(stream: S, observer: &mut O) -> Result<StreamingMessage, ChatError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    ChatError: From<E>,
    O: StreamObserver + ?Sized,
{
    let mut reader = ScopedReader::new(stream);
    let mut framer = LineFramer::new();
    let mut accumulator = StreamAccumulator::new();

    while let Some(chunk) = reader.next().await {
        let chunk = chunk?;

        for line in framer.push(chunk.as_ref()) {
            let Some(event) = decode_line(&line) else {
                continue;
            };

            match accumulator.apply(&event) {
                Signal::Continue => observer.on_update(accumulator.snapshot()),
                Signal::Complete => {
                    reader.release();
                    observer.on_update(accumulator.snapshot());
                    observer.on_complete(accumulator.snapshot());
                    tracing::debug!(events = accumulator.events_applied(), "stream completed");
                    return Ok(accumulator.into_message());
                }
                Signal::Failed(failure) => return Err(ChatError::Server(failure)),
            }
        }
    }

    reader.release();
    if let Some(leftover) = framer.finish() {
        tracing::debug!(leftover = %leftover, "unterminated final line dropped");
    }
    tracing::warn!(events = accumulator.events_applied(), "stream ended without done event");

    Ok(accumulator.into_message())
}

/// Holds the body stream for the duration of one read loop.
///
/// The stream is dropped exactly once: explicitly via `release` on the normal
/// exit paths, or by `Drop` when the loop exits early through `?`.
struct ScopedReader<S> {
    inner: Option<Pin<Box<S>>>,
}

impl<S> ScopedReader<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Some(Box::pin(stream)),
        }
    }

    fn release(&mut self) {
        if self.inner.take().is_some() {
            tracing::trace!("response body reader released");
        }
    }
}

impl<S: Stream> ScopedReader<S> {
    async fn next(&mut self) -> Option<S::Item> {
        match self.inner.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }
}

impl<S> Drop for ScopedReader<S> {
    fn drop(&mut self) {
        self.release();
    }
}
