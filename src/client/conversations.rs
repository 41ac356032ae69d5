//! Stored conversations (REST)

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ClientConfig;
use crate::error::ChatError;
use crate::{MessageRole, ToolStep};

const CONVERSATIONS_PATH: &str = "/api/chat/conversations";

/// Page size the chat sidebar requests
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A conversation as listed in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u32>,
}

/// A persisted message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub role: MessageRole,
    pub content: String,
    /// Reasoning trace, assistant messages only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default)]
    pub intermediate_steps: Vec<ToolStep>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A conversation together with its messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

/// Conversation endpoints, borrowed from a [`StreamClient`](super::StreamClient)
#[derive(Debug, Clone, Copy)]
pub struct ConversationsApi<'a> {
    config: &'a ClientConfig,
    http: &'a reqwest::Client,
}

impl<'a> ConversationsApi<'a> {
    pub(crate) fn new(config: &'a ClientConfig, http: &'a reqwest::Client) -> Self {
        Self { config, http }
    }

    /// One page of conversations, newest first as ordered by the backend
    pub async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Conversation>, ChatError> {
        let url = self.config.url(CONVERSATIONS_PATH);
        let request = self.http.get(&url).query(&[("skip", skip), ("limit", limit)]);
        self.execute(request).await
    }

    /// A conversation with all of its messages
    pub async fn get(&self, id: i64) -> Result<ConversationDetail, ChatError> {
        let url = self.config.url(&format!("{CONVERSATIONS_PATH}/{id}"));
        self.execute(self.http.get(&url)).await
    }

    pub async fn create(&self, title: &str) -> Result<Conversation, ChatError> {
        let url = self.config.url(CONVERSATIONS_PATH);
        self.execute(self.http.post(&url).json(&TitleBody { title })).await
    }

    pub async fn rename(&self, id: i64, title: &str) -> Result<Conversation, ChatError> {
        let url = self.config.url(&format!("{CONVERSATIONS_PATH}/{id}"));
        self.execute(self.http.patch(&url).json(&TitleBody { title })).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ChatError> {
        let url = self.config.url(&format!("{CONVERSATIONS_PATH}/{id}"));
        self.send(self.http.delete(&url)).await.map(|_| ())
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ChatError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send with the REST timeout and return the body of a successful response
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ChatError> {
        let response = request.timeout(self.config.timeout).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(%status, "conversation request failed");
            return Err(ChatError::Http { status, body });
        }
        Ok(body)
    }
}
