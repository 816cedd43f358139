use generative::GenerativeError;
use index::IndexError;
use semantic::resilience::GateError;
use semantic::SemanticError;
use thiserror::Error;

/// Errors surfaced by [`Classifier::classify`](crate::Classifier::classify).
///
/// Only the domain stage can fail a request. Subcategory selection and
/// profiling degrade to tagged empty or neutral outcomes instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("input text is empty")]
    EmptyInput,
    /// The embedding provider failed, timed out, or refused the call.
    #[error("external service failed: {0}")]
    ExternalService(String),
    /// The query vector did not fit the loaded index.
    #[error("domain index rejected the query: {0}")]
    Index(#[from] IndexError),
    #[error("invalid classifier config: {0}")]
    InvalidConfig(String),
    /// A [`LazyClassifier`](crate::LazyClassifier) initializer failed.
    #[error("classifier initialisation failed: {0}")]
    Init(String),
}

impl From<SemanticError> for ClassifyError {
    fn from(e: SemanticError) -> Self {
        ClassifyError::ExternalService(format!("embedding: {e}"))
    }
}

impl From<GenerativeError> for ClassifyError {
    fn from(e: GenerativeError) -> Self {
        ClassifyError::ExternalService(format!("completion: {e}"))
    }
}

impl From<GateError> for ClassifyError {
    fn from(e: GateError) -> Self {
        ClassifyError::ExternalService(e.to_string())
    }
}
