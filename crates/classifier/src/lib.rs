//! # IABC Classifier (`classifier`)
//!
//! Hybrid two-stage content classification over a hierarchical taxonomy.
//!
//! 1. **Domain** ([`Tier1Detector`]): the text prefix is embedded once and
//!    compared against one precomputed vector per top-level domain.
//! 2. **Subcategories** ([`Tier2Classifier`]): the completion provider picks
//!    from that domain's entries only. Its reply is parsed defensively and
//!    every item is reconciled onto a canonical catalog entry; anything that
//!    does not resolve is dropped.
//! 3. **Profile** ([`ProfileEstimator`]): a small reader estimate, from the
//!    same reply or from lexical rules, depending on [`ProfileMode`].
//! 4. **Assembly** ([`combine`]): dedup, rank, cap and tag.
//!
//! Only step 1 can fail a request. Later stages report a tagged
//! [`Tier2Status`] and a [`ProfileSource`] instead of erroring.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use classifier::{Classifier, ClassifierConfig};
//! use generative::{GenerativeConfig, OpenAiCompleter};
//! use index::{EmbeddingIndex, IndexStore};
//! use semantic::{embedder_from_config, SemanticConfig};
//! use taxonomy::{TaxonomyCatalog, TaxonomySource};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = TaxonomyCatalog::load(&TaxonomySource::json_file("data/taxonomy.json"))?;
//! let index = EmbeddingIndex::load(&IndexStore::new("data/index"))?;
//! let key = std::env::var("OPENAI_API_KEY")?;
//! let embedder = embedder_from_config(&SemanticConfig::default().with_api_key(&key))?;
//! let completer = OpenAiCompleter::new(GenerativeConfig::default().with_api_key(&key))?;
//!
//! let classifier = Classifier::new(
//!     Arc::new(catalog),
//!     Arc::new(index),
//!     embedder,
//!     Arc::new(completer),
//!     ClassifierConfig::default(),
//! )?;
//! let result = classifier.classify("The new RAV4 hybrid is a family SUV...").await?;
//! println!("{} {:?}", result.domain, result.candidates);
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod config;
pub mod engine;
pub mod error;
pub mod profile;
pub mod rules;
pub mod tier1;
pub mod tier2;
pub mod types;

mod lazy;

pub use crate::assemble::{combine, rank_candidates};
pub use crate::config::{ClassifierConfig, ProfileMode};
pub use crate::engine::Classifier;
pub use crate::error::ClassifyError;
pub use crate::lazy::LazyClassifier;
pub use crate::profile::ProfileEstimator;
pub use crate::rules::RuleTable;
pub use crate::tier1::Tier1Detector;
pub use crate::tier2::Tier2Classifier;
pub use crate::types::{
    AgeRange, ClassificationCandidate, ClassificationResult, DomainMatch, DomainSource,
    Geekiness, Language, MethodTag, ProfileSource, Sophistication, Tier2Outcome, Tier2Status,
    UserProfileEstimate,
};
