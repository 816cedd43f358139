//! Taxonomy catalog
//!
//! Loads the hierarchical content taxonomy (up to four tiers deep) and
//! answers the read-only questions the classifier asks of it: which entries
//! are top-level domains, which entries belong to a domain, and which entry a
//! loosely spelled name most likely refers to.
//!
//! The catalog is built once and never mutated, so it can be shared freely
//! behind an `Arc`.
//!
//! ```
//! use taxonomy::{TaxonomyCatalog, TaxonomySource};
//!
//! let json = r#"[
//!   {"unique_id":"1","parent":null,"name":"Automotive","tier_1":"Automotive","tier_2":null,"tier_3":null,"tier_4":null},
//!   {"unique_id":"6","parent":"1","name":"SUV","tier_1":"Automotive","tier_2":"SUV","tier_3":null,"tier_4":null}
//! ]"#;
//! let catalog = TaxonomyCatalog::load(&TaxonomySource::JsonStr(json.into())).unwrap();
//! assert_eq!(catalog.tier1_entries().len(), 1);
//! assert_eq!(catalog.subset("Automotive").len(), 2);
//! assert_eq!(catalog.find_by_name("suv").unwrap().unique_id(), "6");
//! ```

mod catalog;
mod entry;
mod error;
mod source;

pub use crate::catalog::{DomainSubset, TaxonomyCatalog};
pub use crate::entry::{RawTaxonomyRecord, TaxonomyEntry, MAX_DEPTH};
pub use crate::error::TaxonomyError;
pub use crate::source::{parse_json_records, TaxonomySource, REQUIRED_COLUMNS};
