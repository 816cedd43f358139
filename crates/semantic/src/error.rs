use thiserror::Error;

use crate::resilience::{is_retryable_error, is_retryable_status, Rejection};

/// Errors surfaced by embedding providers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (missing endpoint, unknown mode, ...).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Nothing to embed.
    #[error("cannot embed empty text")]
    EmptyInput,
    /// The request never produced an HTTP response.
    #[error("HTTP request failed: {0}")]
    Http(String),
    /// The provider answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body could not be turned into a vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The provider's circuit breaker is open.
    #[error("circuit breaker is open for provider '{0}'")]
    CircuitOpen(String),
    /// No rate limit token became available in time.
    #[error("rate limit exceeded for provider '{0}'")]
    RateLimited(String),
}

impl SemanticError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SemanticError::Http(msg) => is_retryable_error(msg),
            SemanticError::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    pub(crate) fn from_rejection(provider: &str, rejection: Rejection<SemanticError>) -> Self {
        match rejection {
            Rejection::CircuitOpen => SemanticError::CircuitOpen(provider.to_string()),
            Rejection::RateLimited => SemanticError::RateLimited(provider.to_string()),
            Rejection::Failed { error, .. } => error,
        }
    }
}
