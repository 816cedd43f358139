use semantic::resilience::{is_retryable_error, is_retryable_status, Rejection};
use thiserror::Error;

/// Errors surfaced by completion providers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerativeError {
    #[error("invalid generative config: {0}")]
    InvalidConfig(String),
    /// The request never produced an HTTP response.
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the chat-completions shape.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
    /// The provider answered but the message content was empty.
    #[error("empty completion")]
    EmptyCompletion,
    #[error("circuit breaker is open for provider '{0}'")]
    CircuitOpen(String),
    #[error("rate limit exceeded for provider '{0}'")]
    RateLimited(String),
}

impl GenerativeError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerativeError::Http(msg) => is_retryable_error(msg),
            GenerativeError::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    pub(crate) fn from_rejection(provider: &str, rejection: Rejection<GenerativeError>) -> Self {
        match rejection {
            Rejection::CircuitOpen => GenerativeError::CircuitOpen(provider.to_string()),
            Rejection::RateLimited => GenerativeError::RateLimited(provider.to_string()),
            Rejection::Failed { error, .. } => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GenerativeError::Status {
            status: 429,
            body: "slow down".into()
        }
        .is_retryable());
        assert!(!GenerativeError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!GenerativeError::EmptyCompletion.is_retryable());
        assert!(!GenerativeError::RateLimited("openai".into()).is_retryable());
    }

    #[test]
    fn rejection_keeps_last_error() {
        let err = GenerativeError::from_rejection(
            "openai",
            Rejection::Failed {
                error: GenerativeError::EmptyCompletion,
                attempts: 3,
            },
        );
        assert_eq!(err, GenerativeError::EmptyCompletion);
        assert_eq!(
            GenerativeError::from_rejection("openai", Rejection::RateLimited).to_string(),
            "rate limit exceeded for provider 'openai'"
        );
    }
}
