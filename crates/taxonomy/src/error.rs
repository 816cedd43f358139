//! Error types produced by the taxonomy crate.
//!
//! Every variant is a data error: the taxonomy source is missing, unreadable,
//! or describes a tree that violates the entry invariants. These are fatal at
//! load time; a catalog is never served half-built.
//!
//! | Error | Trigger |
//! |-------|---------|
//! | [`SourceMissing`](TaxonomyError::SourceMissing) | Source file does not exist |
//! | [`Io`](TaxonomyError::Io) | Source exists but could not be read |
//! | [`Corrupt`](TaxonomyError::Corrupt) | Source is not a JSON array of objects |
//! | [`MissingColumn`](TaxonomyError::MissingColumn) | A record lacks a required column key |
//! | [`InvalidEntry`](TaxonomyError::InvalidEntry) | Empty id/name, missing domain, or a gap in the tier path |
//! | [`DuplicateId`](TaxonomyError::DuplicateId) | Two records share a `unique_id` |
//! | [`Empty`](TaxonomyError::Empty) | No entries after parsing |
use thiserror::Error;

/// Errors raised while loading or validating a taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaxonomyError {
    /// The taxonomy source file does not exist.
    #[error("taxonomy source not found: {0}")]
    SourceMissing(String),
    /// The taxonomy source exists but reading it failed.
    #[error("failed to read taxonomy source: {0}")]
    Io(String),
    /// The source is not valid JSON or not shaped as an array of records.
    #[error("corrupt taxonomy source: {0}")]
    Corrupt(String),
    /// A record is missing one of the required column keys.
    #[error("record {index}: missing required column `{column}`")]
    MissingColumn { index: usize, column: &'static str },
    /// A record violates the entry invariants.
    #[error("invalid taxonomy entry `{id}`: {reason}")]
    InvalidEntry { id: String, reason: String },
    /// Two records share the same identifier.
    #[error("duplicate taxonomy id `{0}`")]
    DuplicateId(String),
    /// The source parsed but contained no entries.
    #[error("taxonomy source contains no entries")]
    Empty,
}

impl TaxonomyError {
    pub(crate) fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        TaxonomyError::InvalidEntry {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_the_column() {
        let err = TaxonomyError::MissingColumn {
            index: 3,
            column: "tier_1",
        };
        assert_eq!(err.to_string(), "record 3: missing required column `tier_1`");
    }

    #[test]
    fn invalid_entry_carries_id_and_reason() {
        let err = TaxonomyError::invalid("42", "tier_3 set without tier_2");
        assert!(err.to_string().contains("`42`"));
        assert!(err.to_string().contains("tier_3 set without tier_2"));
    }
}
