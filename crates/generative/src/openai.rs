use std::time::Duration;

use async_trait::async_trait;
use semantic::resilience::ProviderResilience;
use serde_json::{json, Value};

use crate::{Completer, CompletionRequest, GenerativeConfig, GenerativeError};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug)]
pub struct OpenAiCompleter {
    client: reqwest::Client,
    config: GenerativeConfig,
    resilience: ProviderResilience,
}

impl OpenAiCompleter {
    pub fn new(config: GenerativeConfig) -> Result<Self, GenerativeError> {
        if config.api_url.trim().is_empty() {
            return Err(GenerativeError::InvalidConfig("api_url is empty".into()));
        }
        if config.model_name.trim().is_empty() {
            return Err(GenerativeError::InvalidConfig("model_name is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GenerativeError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        let resilience = ProviderResilience::new(config.provider.clone(), config.resilience);
        Ok(Self {
            client,
            config,
            resilience,
        })
    }

    pub fn resilience(&self) -> &ProviderResilience {
        &self.resilience
    }

    fn body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.config.model_name,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "max_completion_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        })
    }

    async fn send(&self, body: &Value) -> Result<String, GenerativeError> {
        let mut request = self.client.post(&self.config.api_url).json(body);
        if let Some(header) = self.config.api_auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerativeError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerativeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| GenerativeError::InvalidResponse(format!("invalid JSON: {e}")))?;
        extract_message_content(&value)
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerativeError> {
        let body = self.body(request);
        self.resilience
            .execute(GenerativeError::is_retryable, || self.send(&body))
            .await
            .map_err(|r| GenerativeError::from_rejection(self.resilience.provider(), r))
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// `choices[0].message.content` of a chat-completions response.
fn extract_message_content(value: &Value) -> Result<String, GenerativeError> {
    let content = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .ok_or_else(|| {
            GenerativeError::InvalidResponse("missing choices[0].message.content".into())
        })?;

    match content {
        Value::String(text) if !text.trim().is_empty() => Ok(text.clone()),
        Value::String(_) | Value::Null => Err(GenerativeError::EmptyCompletion),
        other => Err(GenerativeError::InvalidResponse(format!(
            "message content is not a string: {other}"
        ))),
    }
}
