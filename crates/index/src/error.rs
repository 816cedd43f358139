use bincode::error::{DecodeError, EncodeError};
use semantic::SemanticError;
use thiserror::Error;

/// Errors raised while building, persisting, or querying the domain index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A persisted artifact is missing; run the build step first.
    #[error("index artifact not found: {0}")]
    NotFound(String),
    /// Artifacts or inputs are inconsistent (misaligned, wrong dimension, zero vector).
    #[error("invalid index data: {0}")]
    Data(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("index io error: {0}")]
    Io(String),
    /// The embedder failed while building the index.
    #[error("embedding failed: {0}")]
    Embedding(#[from] SemanticError),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Decode(e.to_string())
    }
}
