//! Domain embedding index
//!
//! Tier-1 detection compares a text embedding against one vector per
//! top-level taxonomy domain. [`EmbeddingIndex`] holds those vectors,
//! normalized, and answers [`nearest`](EmbeddingIndex::nearest) queries by
//! exhaustive cosine search. With a few dozen domains a linear scan is the
//! fastest option there is.
//!
//! [`IndexStore`] persists an index as two artifacts in one directory: a
//! bincode vector file and a JSON domain list. The build step writes them once
//! and every process start loads them.
//!
//! ```
//! use index::{EmbeddingIndex, IndexStore};
//!
//! let index = EmbeddingIndex::from_parts(
//!     vec!["Automotive".into(), "Travel".into()],
//!     vec![vec![1.0, 0.0], vec![0.0, 1.0]],
//! )
//! .unwrap();
//! let hits = index.nearest(&[0.9, 0.1], 1).unwrap();
//! assert_eq!(hits[0].domain, "Automotive");
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = IndexStore::new(dir.path());
//! index.persist(&store).unwrap();
//! assert_eq!(EmbeddingIndex::load(&store).unwrap(), index);
//! ```

mod embedding_index;
mod error;
mod store;

/// Version tag written into the vector artifact; loads reject anything else.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

pub use crate::embedding_index::{DomainScore, EmbeddingIndex, TIE_EPSILON, UNIT_NORM_TOLERANCE};
pub use crate::error::IndexError;
pub use crate::store::{IndexStore, DOMAINS_FILE, VECTORS_FILE};
