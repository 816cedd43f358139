use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{Embedder, SemanticError};

/// Deterministic offline embedder.
///
/// Lowercased alphanumeric tokens are hashed into signed buckets, so texts
/// sharing vocabulary land close together. Text without any token falls back
/// to a sinusoid seeded by the hash of the whole string.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
    normalize: bool,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            normalize: true,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Synchronous core of [`Embedder::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        let mut tokens = 0usize;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = hash64(token.to_lowercase().as_bytes());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
            tokens += 1;
        }

        if tokens == 0 || v.iter().all(|x| *x == 0.0) {
            // hash64 of the empty string is zero; the seed bit and the
            // per-index phase keep the fallback away from the zero vector.
            let h = hash64(text.as_bytes()) | 1;
            for (idx, value) in v.iter_mut().enumerate() {
                let phase = (idx % 64) as f32 + 1.0;
                *value = ((h >> (idx % 32)) as f32 * 0.0001 + phase).sin();
            }
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(self.embed_sync(text))
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
