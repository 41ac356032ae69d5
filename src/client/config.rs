//! Client configuration

use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Streaming chat endpoint, relative to the base URL
pub const DEFAULT_STREAM_PATH: &str = "/api/chat/stream-v2";

/// REST request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection establishment timeout, applied to streaming requests too
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable overriding [`ClientConfig::base_url`]
pub const BASE_URL_ENV: &str = "AGENTMIND_BASE_URL";

/// Environment variable overriding [`ClientConfig::timeout`], in seconds
pub const TIMEOUT_ENV: &str = "AGENTMIND_TIMEOUT_SECS";

/// Where and how to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the backend, without a trailing slash
    pub base_url: String,
    /// Path of the streaming chat endpoint
    pub stream_path: String,
    /// Timeout of REST requests. Streaming responses are not bounded by it.
    pub timeout: Duration,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `AGENTMIND_BASE_URL` and `AGENTMIND_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config = config.base_url(url);
        }
        if let Some(secs) = std::env::var(TIMEOUT_ENV).ok().and_then(|v| v.trim().parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Set the backend base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the streaming endpoint path
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Set the REST request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Absolute URL of an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL of the streaming endpoint
    pub fn stream_url(&self) -> String {
        self.url(&self.stream_path)
    }
}
