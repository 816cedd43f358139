use std::sync::Arc;

use async_trait::async_trait;

use crate::SemanticError;

/// Anything that can turn text into a dense vector.
///
/// Implementations may return vectors of any norm; callers normalize.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError>;

    /// Identifier of the underlying model, for logs and artifacts.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        (**self).embed(text).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
