use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::types::ClassificationResult;
use crate::{Classifier, ClassifyError};

type InitFuture = Pin<Box<dyn Future<Output = Result<Classifier, ClassifyError>> + Send>>;

/// A [`Classifier`] built on first use.
///
/// Concurrent first callers wait on one shared initialisation. A failed
/// initialisation leaves the cell empty so the next caller retries.
pub struct LazyClassifier {
    cell: OnceCell<Arc<Classifier>>,
    init: Box<dyn Fn() -> InitFuture + Send + Sync>,
}

impl LazyClassifier {
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Classifier, ClassifyError>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Box::new(move || Box::pin(init())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<Classifier>, ClassifyError> {
        self.cell
            .get_or_try_init(|| async {
                let classifier = (self.init)().await?;
                info!(
                    domains = classifier.tier1().index().len(),
                    entries = classifier.catalog().len(),
                    "classifier_initialized"
                );
                Ok::<_, ClassifyError>(Arc::new(classifier))
            })
            .await
            .cloned()
    }

    pub async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        self.get().await?.classify(text).await
    }
}
