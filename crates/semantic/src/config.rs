use serde::{Deserialize, Serialize};

use crate::resilience::ResilienceConfig;

/// Default OpenAI embeddings endpoint.
pub const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Runtime configuration for the embedding provider.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig::default().with_api_key("sk-test");
/// assert_eq!(cfg.mode, "api");
/// assert_eq!(cfg.api_auth_header.as_deref(), Some("Bearer sk-test"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// `"api"` (remote HTTP) or `"stub"` (deterministic hashed vectors).
    pub mode: String,
    /// Model identifier sent to the provider.
    pub model_name: String,
    /// Embedding endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g. `"Bearer sk-..."`). Never serialized.
    #[serde(skip_serializing)]
    pub api_auth_header: Option<String>,
    /// Payload shape: `"openai"` (default), `"hf"`, or `"custom"`.
    pub api_provider: Option<String>,
    /// Overall HTTP timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Vector length produced by the stub.
    pub stub_dimension: usize,
    /// L2-normalize returned vectors.
    pub normalize: bool,
    pub resilience: ResilienceConfig,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            model_name: "text-embedding-3-small".into(),
            api_url: Some(OPENAI_EMBEDDINGS_URL.into()),
            api_auth_header: None,
            api_provider: Some("openai".into()),
            api_timeout_secs: Some(30),
            stub_dimension: 384,
            normalize: true,
            resilience: ResilienceConfig::default(),
        }
    }
}

impl SemanticConfig {
    /// Offline configuration backed by the stub embedder.
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: "stub".into(),
            model_name: "stub".into(),
            api_url: None,
            api_provider: None,
            stub_dimension: dimension,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_auth_header = Some(format!("Bearer {}", key.trim()));
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
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

    /// Provider label used for logs and resilience bookkeeping.
    pub fn provider_name(&self) -> String {
        self.api_provider
            .as_deref()
            .unwrap_or("custom")
            .to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_openai_small_model() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, "api");
        assert_eq!(cfg.model_name, "text-embedding-3-small");
        assert_eq!(cfg.api_url.as_deref(), Some(OPENAI_EMBEDDINGS_URL));
        assert_eq!(cfg.provider_name(), "openai");
        assert!(cfg.normalize);
        assert!(cfg.resilience.enabled);
    }

    #[test]
    fn stub_config_has_no_endpoint() {
        let cfg = SemanticConfig::stub(64);
        assert_eq!(cfg.mode, "stub");
        assert_eq!(cfg.stub_dimension, 64);
        assert!(cfg.api_url.is_none());
        assert_eq!(cfg.provider_name(), "custom");
    }

    #[test]
    fn auth_header_is_never_serialized() {
        let cfg = SemanticConfig::default().with_api_key("sk-secret");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: SemanticConfig = serde_json::from_str(r#"{"mode":"stub"}"#).unwrap();
        assert_eq!(cfg.mode, "stub");
        assert_eq!(cfg.stub_dimension, 384);
        assert_eq!(cfg.model_name, "text-embedding-3-small");
    }
}
