//! Observable chat session.
//!
//! [`ChatSession`] is the stateful face of [`StreamClient`]: it tracks the
//! status of the current response, publishes every snapshot through a
//! `tokio::sync::watch` channel, and accepts cancel/reset actions.
//!
//! ```text
//! idle ──send──▶ streaming ──done──▶ completed
//!                    │
//!                    └──failure──▶ error
//! completed / error ──cancel|reset──▶ idle
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::client::{ChatRequest, StreamClient, StreamObserver};
use crate::error::{ChatError, StreamFailure};
use crate::StreamingMessage;

/// Lifecycle of the session's current response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Idle,
    Streaming,
    Completed,
    Error,
}

/// Everything a UI needs to render the in-progress turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: StreamStatus,
    /// The assistant message being streamed, or the last completed one until cleared
    pub streaming_message: Option<StreamingMessage>,
    /// Failure of the last send
    pub error: Option<StreamFailure>,
}

impl SessionState {
    pub fn is_streaming(&self) -> bool {
        self.status == StreamStatus::Streaming
    }
}

/// Synchronous state changes accepted by [`ChatSession::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the in-progress message and return to idle
    Cancel,
    /// Cancel and clear the last error
    Reset,
    /// Forget the streamed message, keeping the status
    ClearStreamingMessage,
}

/// One conversation view's streaming state.
///
/// Only one send may be in flight at a time; a second `send` is rejected with
/// [`ChatError::SendInProgress`]. Cancelling does not abort the HTTP request,
/// it detaches it: whatever it still produces is no longer published.
pub struct ChatSession {
    client: StreamClient,
    state: watch::Sender<SessionState>,
    next_generation: AtomicU64,
    // Generation of the send whose updates are published, 0 when none.
    active: AtomicU64,
}

impl ChatSession {
    pub fn new(client: StreamClient) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            client,
            state,
            next_generation: AtomicU64::new(1),
            active: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &StreamClient {
        &self.client
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Stream the answer to `request`, publishing each snapshot.
    ///
    /// A stream that ends without `done` leaves the session `completed` with
    /// the partial message, whose `is_complete` stays false.
    pub async fn send(&self, request: &ChatRequest) -> Result<StreamingMessage, ChatError> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let _guard = ActiveSend::acquire(&self.active, generation).ok_or(ChatError::SendInProgress)?;

        self.state.send_replace(SessionState {
            status: StreamStatus::Streaming,
            streaming_message: Some(StreamingMessage::new()),
            error: None,
        });

        let mut observer = SessionObserver {
            session: self,
            generation,
        };
        let result = self.client.stream_chat(request, &mut observer).await;

        if let Ok(message) = &result {
            if !message.is_complete {
                self.publish(generation, |state| {
                    state.status = StreamStatus::Completed;
                    state.streaming_message = Some(message.clone());
                });
            }
        }
        result
    }

    pub fn dispatch(&self, action: Action) {
        match action {
            Action::Cancel => self.cancel(),
            Action::Reset => self.reset(),
            Action::ClearStreamingMessage => self.clear_streaming_message(),
        }
    }

    /// Return to idle and detach any in-flight send
    pub fn cancel(&self) {
        self.state.send_modify(|state| {
            self.active.store(0, Ordering::SeqCst);
            state.status = StreamStatus::Idle;
            state.streaming_message = None;
        });
    }

    /// Cancel and clear the last error
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.active.store(0, Ordering::SeqCst);
            *state = SessionState::default();
        });
    }

    pub fn clear_streaming_message(&self) {
        self.state.send_modify(|state| state.streaming_message = None);
    }

    /// Apply `update` if `generation` is still the published send
    fn publish(&self, generation: u64, update: impl FnOnce(&mut SessionState)) {
        let published = self.state.send_if_modified(|state| {
            if self.active.load(Ordering::SeqCst) != generation {
                return false;
            }
            update(state);
            true
        });
        if !published {
            tracing::trace!(generation, "dropping update of detached send");
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("client", &self.client)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// Marks a send as the session's active one until dropped
struct ActiveSend<'a> {
    active: &'a AtomicU64,
    generation: u64,
}

impl<'a> ActiveSend<'a> {
    fn acquire(active: &'a AtomicU64, generation: u64) -> Option<Self> {
        active
            .compare_exchange(0, generation, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { active, generation })
    }
}

impl Drop for ActiveSend<'_> {
    fn drop(&mut self) {
        // A cancel may already have cleared or replaced us.
        let _ = self
            .active
            .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

struct SessionObserver<'a> {
    session: &'a ChatSession,
    generation: u64,
}

impl StreamObserver for SessionObserver<'_> {
    fn on_update(&mut self, message: &StreamingMessage) {
        self.session.publish(self.generation, |state| {
            state.streaming_message = Some(message.clone());
        });
    }

    fn on_complete(&mut self, message: &StreamingMessage) {
        self.session.publish(self.generation, |state| {
            state.status = StreamStatus::Completed;
            state.streaming_message = Some(message.clone());
        });
    }

    fn on_error(&mut self, failure: &StreamFailure) {
        self.session.publish(self.generation, |state| {
            state.status = StreamStatus::Error;
            state.streaming_message = None;
            state.error = Some(failure.clone());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;

    fn session() -> ChatSession {
        // Unroutable port; these tests never touch the network.
        let client = StreamClient::new(ClientConfig::default().base_url("http://127.0.0.1:9")).unwrap();
        ChatSession::new(client)
    }

    #[test]
    fn starts_idle() {
        let session = session();
        let state = session.state();
        assert_eq!(state.status, StreamStatus::Idle);
        assert!(state.streaming_message.is_none());
        assert!(state.error.is_none());
        assert!(!state.is_streaming());
    }

    #[test]
    fn detached_updates_are_dropped() {
        let session = session();
        let guard = ActiveSend::acquire(&session.active, 7).unwrap();

        session.publish(7, |state| state.status = StreamStatus::Streaming);
        assert_eq!(session.state().status, StreamStatus::Streaming);

        session.cancel();
        session.publish(7, |state| state.status = StreamStatus::Completed);
        assert_eq!(session.state().status, StreamStatus::Idle);
        drop(guard);
    }

    #[test]
    fn second_active_send_is_rejected() {
        let session = session();
        let first = ActiveSend::acquire(&session.active, 1).unwrap();
        assert!(ActiveSend::acquire(&session.active, 2).is_none());
        drop(first);
        assert!(ActiveSend::acquire(&session.active, 3).is_some());
    }

    #[test]
    fn cancel_frees_the_session_for_a_new_send() {
        let session = session();
        let stale = ActiveSend::acquire(&session.active, 1).unwrap();
        session.cancel();

        let fresh = ActiveSend::acquire(&session.active, 2).unwrap();
        // The detached send finishing must not release the new one.
        drop(stale);
        assert_eq!(session.active.load(Ordering::SeqCst), 2);
        drop(fresh);
    }

    #[test]
    fn reset_clears_error() {
        let session = session();
        session.state.send_replace(SessionState {
            status: StreamStatus::Error,
            streaming_message: None,
            error: Some(StreamFailure::new("boom", "REQUEST_ERROR")),
        });

        session.dispatch(Action::Reset);
        assert_eq!(session.state(), SessionState::default());
    }

    #[test]
    fn clear_keeps_status() {
        let session = session();
        session.state.send_replace(SessionState {
            status: StreamStatus::Completed,
            streaming_message: Some(StreamingMessage::new()),
            error: None,
        });

        session.dispatch(Action::ClearStreamingMessage);
        let state = session.state();
        assert_eq!(state.status, StreamStatus::Completed);
        assert!(state.streaming_message.is_none());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(StreamStatus::Streaming).unwrap(), "streaming");
        assert_eq!(serde_json::to_value(StreamStatus::Error).unwrap(), "error");
    }
}
