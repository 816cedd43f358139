use std::sync::Arc;

use index::EmbeddingIndex;
use semantic::resilience::CallGate;
use semantic::{l2_normalize_in_place, Embedder};
use tracing::debug;

use crate::types::DomainMatch;
use crate::ClassifyError;

/// Longest prefix of `text` holding at most `max_chars` characters.
pub(crate) fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Picks the top-level domain with one embedding call and an index lookup.
pub struct Tier1Detector {
    index: Arc<EmbeddingIndex>,
    embedder: Arc<dyn Embedder>,
    gate: CallGate,
    prefix_chars: usize,
}

impl Tier1Detector {
    pub fn new(
        index: Arc<EmbeddingIndex>,
        embedder: Arc<dyn Embedder>,
        gate: CallGate,
        prefix_chars: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            gate,
            prefix_chars,
        }
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Best domain for `text`. There is no threshold; low confidence is
    /// still a match.
    pub async fn detect(&self, text: &str) -> Result<DomainMatch, ClassifyError> {
        self.detect_with_top_matches(text, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClassifyError::InvalidConfig("domain index is empty".into()))
    }

    /// Every domain ranked by similarity, truncated to `top_n`.
    pub async fn detect_with_top_matches(
        &self,
        text: &str,
        top_n: usize,
    ) -> Result<Vec<DomainMatch>, ClassifyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let prefix = char_prefix(text, self.prefix_chars);

        let mut vector = self.gate.run(self.embedder.embed(prefix)).await??;
        l2_normalize_in_place(&mut vector);

        let hits = self.index.nearest(&vector, top_n)?;
        debug!(
            chars = prefix.chars().count(),
            best = hits.first().map(|h| h.domain.as_str()).unwrap_or_default(),
            "tier1_detected"
        );
        Ok(hits
            .into_iter()
            .map(|hit| DomainMatch::embedding(hit.domain, hit.score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::resilience::GateConfig;
    use semantic::{SemanticError, StubEmbedder};
    use std::time::Duration;

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
            Err(SemanticError::Http("connection refused".into()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    struct SlowEmbedder;

    #[async_trait::async_trait]
    impl Embedder for SlowEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![1.0, 0.0])
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    async fn stub_detector() -> Tier1Detector {
        let embedder = Arc::new(StubEmbedder::new(256));
        let descriptions = vec![
            (
                "Automotive".to_string(),
                "Domain: Automotive. Main categories: SUV, sedan, car, vehicle, engine".to_string(),
            ),
            (
                "Travel".to_string(),
                "Domain: Travel. Main categories: flights, hotels, beach, vacation".to_string(),
            ),
        ];
        let index = EmbeddingIndex::build(&descriptions, embedder.as_ref()).await.unwrap();
        Tier1Detector::new(Arc::new(index), embedder, CallGate::default(), 8000)
    }

    #[test]
    fn char_prefix_respects_char_boundaries() {
        assert_eq!(char_prefix("トヨタの車", 3), "トヨタ");
        assert_eq!(char_prefix("short", 100), "short");
        assert_eq!(char_prefix("abc", 0), "");
    }

    #[tokio::test]
    async fn detects_best_domain() {
        let detector = stub_detector().await;
        let m = detector.detect("a compact SUV car with a strong engine").await.unwrap();
        assert_eq!(m.domain, "Automotive");
        assert!(m.confidence > 0.0 && m.confidence <= 1.0 + 1e-6);
    }

    #[tokio::test]
    async fn top_matches_are_ranked() {
        let detector = stub_detector().await;
        let hits = detector
            .detect_with_top_matches("cheap flights and beach hotels for vacation", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].domain, "Travel");
        assert!(hits[0].confidence >= hits[1].confidence);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let detector = stub_detector().await;
        assert_eq!(detector.detect("   ").await, Err(ClassifyError::EmptyInput));
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let index = EmbeddingIndex::from_parts(vec!["A".into()], vec![vec![1.0, 0.0]]).unwrap();
        let detector =
            Tier1Detector::new(Arc::new(index), Arc::new(FailingEmbedder), CallGate::default(), 10);
        assert!(matches!(
            detector.detect("anything").await,
            Err(ClassifyError::ExternalService(_))
        ));
    }

    #[tokio::test]
    async fn embedding_timeout_is_an_external_failure() {
        let index = EmbeddingIndex::from_parts(vec!["A".into()], vec![vec![1.0, 0.0]]).unwrap();
        let gate = CallGate::new(GateConfig::default().with_call_timeout(Duration::from_millis(20)));
        let detector = Tier1Detector::new(Arc::new(index), Arc::new(SlowEmbedder), gate, 10);
        assert!(matches!(
            detector.detect("anything").await,
            Err(ClassifyError::ExternalService(_))
        ));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_index_error() {
        let index = EmbeddingIndex::from_parts(vec!["A".into()], vec![vec![1.0, 0.0]]).unwrap();
        let detector = Tier1Detector::new(
            Arc::new(index),
            Arc::new(StubEmbedder::new(16)),
            CallGate::default(),
            10,
        );
        assert!(matches!(
            detector.detect("anything").await,
            Err(ClassifyError::Index(_))
        ));
    }
}
