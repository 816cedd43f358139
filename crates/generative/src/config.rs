use serde::{Deserialize, Serialize};

use semantic::resilience::ResilienceConfig;

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Configuration for the chat-completions client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerativeConfig {
    pub api_url: String,
    pub model_name: String,
    /// Authorization header (e.g. `"Bearer sk-..."`). Never serialized.
    #[serde(skip_serializing)]
    pub api_auth_header: Option<String>,
    pub api_timeout_secs: u64,
    /// Sampling temperature applied when a request does not override it.
    pub temperature: f32,
    /// Completion token budget applied when a request does not override it.
    pub max_tokens: u32,
    /// Label used in logs and resilience bookkeeping.
    pub provider: String,
    pub resilience: ResilienceConfig,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            api_url: OPENAI_CHAT_COMPLETIONS_URL.into(),
            model_name: "gpt-4o-mini".into(),
            api_auth_header: None,
            api_timeout_secs: 30,
            temperature: 0.1,
            max_tokens: 1000,
            provider: "openai".into(),
            resilience: ResilienceConfig::default(),
        }
    }
}

impl GenerativeConfig {
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_auth_header = Some(format!("Bearer {}", key.trim()));
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_resilience(mut self, resilience: ResilienceConfig) -> Self {
        self.resilience = resilience;
        self
    }
}
