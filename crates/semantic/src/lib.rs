//! Text embeddings and provider resilience
//!
//! This crate turns text into dense vectors through the [`Embedder`] trait
//! and carries the resilience primitives every external call in the workspace
//! goes through.
//!
//! Two embedders ship here:
//!
//! - [`ApiEmbedder`] calls a remote endpoint (OpenAI by default, Hugging Face
//!   or a minimal custom shape on request). Each instance owns its circuit
//!   breaker, token bucket, and retry policy.
//! - [`StubEmbedder`] hashes tokens into a fixed-size vector. Deterministic and
//!   offline; handy for tests and for running the pipeline without keys.
//!
//! The [`resilience::CallGate`] bounds how many external calls are in flight
//! at once and puts a deadline on each of them.
//!
//! ```
//! use semantic::{cosine, Embedder, StubEmbedder};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let embedder = StubEmbedder::new(64);
//! let a = rt.block_on(embedder.embed("compact SUV review")).unwrap();
//! let b = rt.block_on(embedder.embed("compact SUV review")).unwrap();
//! assert!((cosine(&a, &b) - 1.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod error;
pub mod resilience;
pub mod serde_millis;

mod api;
mod embedder;
mod normalize;
mod stub;

use std::sync::Arc;

pub use crate::api::ApiEmbedder;
pub use crate::config::{SemanticConfig, OPENAI_EMBEDDINGS_URL};
pub use crate::embedder::Embedder;
pub use crate::error::SemanticError;
pub use crate::normalize::{cosine, dot, l2_norm, l2_normalize_in_place};
pub use crate::stub::StubEmbedder;

/// Build the embedder selected by `cfg.mode`.
pub fn embedder_from_config(cfg: &SemanticConfig) -> Result<Arc<dyn Embedder>, SemanticError> {
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ApiEmbedder::new(cfg)?)),
        "stub" | "fast" => Ok(Arc::new(
            StubEmbedder::new(cfg.stub_dimension).with_normalize(cfg.normalize),
        )),
        other => Err(SemanticError::InvalidConfig(format!(
            "unknown embedding mode `{other}` (expected `api` or `stub`)"
        ))),
    }
}
