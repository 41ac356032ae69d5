//! Chat request and its wire body

use serde::{Deserialize, Serialize};

/// Model selection for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider, e.g. "dashscope" or "openai"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model, e.g. "qwen-max"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature (0-2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Completion token limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    /// Provider and model, no sampling overrides
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            model: Some(model.into()),
            ..Self::default()
        }
    }
}

/// A user message and its per-request options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Existing conversation to continue; `None` starts a new one
    pub conversation_id: Option<i64>,
    pub llm_config: Option<LlmConfig>,
    /// Role preset id
    pub role_id: Option<String>,
    /// Older name of `role_id`, used only when `role_id` is unset or empty
    pub role_preset_id: Option<String>,
    pub plan_mode: Option<bool>,
    /// Knowledge base to retrieve from
    pub use_knowledge_base: Option<String>,
    /// Web search provider, e.g. "tavily" or "baidu"
    pub search_provider: Option<String>,
    pub deep_reasoning: Option<bool>,
}

impl ChatRequest {
    /// A request with no options set
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_conversation(mut self, id: i64) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn with_llm_config(mut self, config: LlmConfig) -> Self {
        self.llm_config = Some(config);
        self
    }

    pub fn with_role(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    pub fn with_plan_mode(mut self, enabled: bool) -> Self {
        self.plan_mode = Some(enabled);
        self
    }

    pub fn with_knowledge_base(mut self, name: impl Into<String>) -> Self {
        self.use_knowledge_base = Some(name.into());
        self
    }

    pub fn with_search_provider(mut self, provider: impl Into<String>) -> Self {
        self.search_provider = Some(provider.into());
        self
    }

    pub fn with_deep_reasoning(mut self, enabled: bool) -> Self {
        self.deep_reasoning = Some(enabled);
        self
    }

    /// The JSON body posted to the streaming endpoint
    pub fn to_body(&self) -> ChatStreamBody<'_> {
        let role_id = self
            .role_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.role_preset_id.as_deref());

        ChatStreamBody {
            message: self.message.trim(),
            conversation_id: self.conversation_id,
            llm_config: self.llm_config.as_ref(),
            role_id,
            plan_mode: self.plan_mode,
            use_knowledge_base: self.use_knowledge_base.as_deref(),
            search_provider: self.search_provider.as_deref(),
            deep_reasoning: self.deep_reasoning,
        }
    }
}

/// Wire body of a streaming chat request. Unset options are omitted, never
/// sent as `null`.
#[derive(Debug, Serialize)]
pub struct ChatStreamBody<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<&'a LlmConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_knowledge_base: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_provider: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_reasoning: Option<bool>,
}
