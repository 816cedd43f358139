use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::normalize::l2_normalize_in_place;
use crate::resilience::ProviderResilience;
use crate::{Embedder, SemanticConfig, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

impl ApiProviderKind {
    fn from_config(cfg: &SemanticConfig) -> Self {
        match cfg.provider_name().as_str() {
            "hf" | "huggingface" => ApiProviderKind::HuggingFace,
            "openai" | "gpt" => ApiProviderKind::OpenAI,
            _ => ApiProviderKind::Custom,
        }
    }
}

/// Remote embedding client speaking the OpenAI, Hugging Face, or a minimal
/// custom JSON shape.
///
/// Holds its own HTTP client and resilience state; construct once and share.
#[derive(Debug)]
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    kind: ApiProviderKind,
    model_name: String,
    normalize: bool,
    resilience: ProviderResilience,
}

impl ApiEmbedder {
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;
        let timeout = Duration::from_secs(cfg.api_timeout_secs.unwrap_or(30));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            auth_header: cfg.api_auth_header.clone(),
            kind: ApiProviderKind::from_config(cfg),
            model_name: cfg.model_name.clone(),
            normalize: cfg.normalize,
            resilience: ProviderResilience::new(cfg.provider_name(), cfg.resilience),
        })
    }

    pub fn resilience(&self) -> &ProviderResilience {
        &self.resilience
    }

    fn payload(&self, text: &str) -> Value {
        build_api_payload(self.kind, text, &self.model_name)
    }

    async fn send(&self, payload: &Value) -> Result<Value, SemanticError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| SemanticError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::InvalidResponse(format!("invalid JSON: {e}")))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        if text.trim().is_empty() {
            return Err(SemanticError::EmptyInput);
        }
        let payload = self.payload(text);
        let response = self
            .resilience
            .execute(SemanticError::is_retryable, || self.send(&payload))
            .await
            .map_err(|r| SemanticError::from_rejection(self.resilience.provider(), r))?;

        let mut embedding = parse_embeddings_from_value(response)?
            .into_iter()
            .next()
            .ok_or_else(|| SemanticError::InvalidResponse("response contained no embeddings".into()))?;
        if embedding.is_empty() {
            return Err(SemanticError::InvalidResponse("empty embedding vector".into()));
        }
        if self.normalize {
            l2_normalize_in_place(&mut embedding);
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn build_api_payload(kind: ApiProviderKind, text: &str, model: &str) -> Value {
    match kind {
        ApiProviderKind::HuggingFace => json!({ "inputs": text }),
        ApiProviderKind::OpenAI => json!({ "input": text, "model": model }),
        ApiProviderKind::Custom => json!({ "text": text }),
    }
}

/// Accepts `{"data":[{"embedding":[..]}]}` (OpenAI), `{"embeddings":[[..]]}`,
/// a bare vector, or a list of vectors.
fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::InvalidResponse(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::InvalidResponse(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::InvalidResponse(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            items.into_iter().map(parse_embedding_vector).collect()
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                    SemanticError::InvalidResponse("non-finite embedding value".into())
                }),
                other => Err(SemanticError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::InvalidResponse(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitBreakerConfig, CircuitState, ResilienceConfig, RetryConfig};

    #[test]
    fn provider_kind_from_config() {
        let mut cfg = SemanticConfig::default();
        assert_eq!(ApiProviderKind::from_config(&cfg), ApiProviderKind::OpenAI);
        cfg.api_provider = Some("HF".into());
        assert_eq!(ApiProviderKind::from_config(&cfg), ApiProviderKind::HuggingFace);
        cfg.api_provider = None;
        assert_eq!(ApiProviderKind::from_config(&cfg), ApiProviderKind::Custom);
    }

    #[test]
    fn payload_shapes() {
        assert_eq!(
            build_api_payload(ApiProviderKind::OpenAI, "hi", "text-embedding-3-small"),
            json!({"input": "hi", "model": "text-embedding-3-small"})
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::HuggingFace, "hi", "m"),
            json!({"inputs": "hi"})
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::Custom, "hi", "m"),
            json!({"text": "hi"})
        );
    }

    #[test]
    fn parses_openai_response() {
        let body = json!({"object": "list", "data": [{"index": 0, "embedding": [0.5, -0.5]}]});
        assert_eq!(parse_embeddings_from_value(body).unwrap(), vec![vec![0.5, -0.5]]);
    }

    #[test]
    fn parses_bare_and_nested_arrays() {
        assert_eq!(
            parse_embedding_collection(json!([[1.0, 2.0], [3.0, 4.0]])).unwrap().len(),
            2
        );
        assert_eq!(
            parse_embedding_collection(json!([1.0, 2.0, 3.0])).unwrap(),
            vec![vec![1.0, 2.0, 3.0]]
        );
        assert!(parse_embedding_collection(json!([])).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(matches!(
            parse_embeddings_from_value(json!({"data": [{"vector": [1.0]}]})),
            Err(SemanticError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_embeddings_from_value(json!({"error": "nope"})),
            Err(SemanticError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_embedding_vector(json!(["a"])),
            Err(SemanticError::InvalidResponse(_))
        ));
    }

    #[test]
    fn new_requires_url() {
        let cfg = SemanticConfig {
            api_url: None,
            ..SemanticConfig::default()
        };
        assert!(matches!(
            ApiEmbedder::new(&cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_sending() {
        let embedder = ApiEmbedder::new(&SemanticConfig::default()).unwrap();
        assert_eq!(embedder.embed("   ").await, Err(SemanticError::EmptyInput));
    }

    #[tokio::test]
    async fn unreachable_endpoint_opens_breaker() {
        let resilience = ResilienceConfig::default()
            .with_retry(
                RetryConfig::default()
                    .with_max_retries(0)
                    .with_base_delay(Duration::from_millis(1)),
            )
            .with_circuit_breaker(CircuitBreakerConfig::default().with_failure_threshold(1));
        let cfg = SemanticConfig::default()
            .with_api_url("http://127.0.0.1:9/embed")
            .with_resilience(resilience);
        let embedder = ApiEmbedder::new(&cfg).unwrap();

        let first = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(first, SemanticError::Http(_)));
        assert_eq!(embedder.resilience().circuit_state(), CircuitState::Open);

        let second = embedder.embed("hello").await.unwrap_err();
        assert_eq!(second, SemanticError::CircuitOpen("openai".into()));
    }
}
