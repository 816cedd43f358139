//! Taxonomy sources and record parsing.
//!
//! The offline converter turns the tabular taxonomy into a JSON array of
//! records with the columns `unique_id, parent, name, tier_1..tier_4`. Column
//! *keys* are mandatory even when their value is `null`, so a source produced
//! from a table that lost a column is rejected instead of silently loading
//! every entry as a domain.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::entry::{RawTaxonomyRecord, TaxonomyEntry};
use crate::error::TaxonomyError;

/// Column keys every JSON record must carry. `parent` is optional.
pub const REQUIRED_COLUMNS: [&str; 6] = ["unique_id", "name", "tier_1", "tier_2", "tier_3", "tier_4"];

/// Identifier used by the converter for a leaked header row.
const HEADER_ROW_ID: &str = "Unique ID";

/// Where a catalog gets its entries from.
#[derive(Debug, Clone)]
pub enum TaxonomySource {
    /// JSON file on disk.
    JsonFile(PathBuf),
    /// JSON document already in memory.
    JsonStr(String),
    /// Records parsed by the caller.
    Records(Vec<RawTaxonomyRecord>),
}

impl TaxonomySource {
    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        TaxonomySource::JsonFile(path.into())
    }

    /// Parse the source into validated entries, in source order.
    pub fn read_entries(&self) -> Result<Vec<TaxonomyEntry>, TaxonomyError> {
        match self {
            TaxonomySource::JsonFile(path) => {
                let text = fs::read_to_string(path).map_err(|err| match err.kind() {
                    io::ErrorKind::NotFound => {
                        TaxonomyError::SourceMissing(path.display().to_string())
                    }
                    _ => TaxonomyError::Io(format!("{}: {err}", path.display())),
                })?;
                parse_json_records(&text)
            }
            TaxonomySource::JsonStr(text) => parse_json_records(text),
            TaxonomySource::Records(records) => records
                .iter()
                .filter(|record| !is_header(record))
                .cloned()
                .map(TaxonomyEntry::try_from)
                .collect(),
        }
    }
}

/// Parse a JSON array of taxonomy records.
pub fn parse_json_records(text: &str) -> Result<Vec<TaxonomyEntry>, TaxonomyError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| TaxonomyError::Corrupt(err.to_string()))?;
    let Value::Array(rows) = value else {
        return Err(TaxonomyError::Corrupt(
            "expected a JSON array of records".into(),
        ));
    };

    let mut entries = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let Value::Object(map) = row else {
            return Err(TaxonomyError::Corrupt(format!(
                "record {index} is not an object"
            )));
        };
        let record = record_from_map(index, &map)?;
        if is_header(&record) {
            continue;
        }
        entries.push(TaxonomyEntry::try_from(record)?);
    }
    Ok(entries)
}

fn record_from_map(index: usize, map: &Map<String, Value>) -> Result<RawTaxonomyRecord, TaxonomyError> {
    for column in REQUIRED_COLUMNS {
        if !map.contains_key(column) {
            return Err(TaxonomyError::MissingColumn { index, column });
        }
    }

    let field = |key: &str| -> Result<Option<String>, TaxonomyError> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            // Numeric ids survive spreadsheet round trips as numbers.
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(TaxonomyError::Corrupt(format!(
                "record {index}: column `{key}` has unsupported value {other}"
            ))),
        }
    };

    Ok(RawTaxonomyRecord {
        unique_id: field("unique_id")?,
        parent: field("parent")?,
        name: field("name")?,
        tier_1: field("tier_1")?,
        tier_2: field("tier_2")?,
        tier_3: field("tier_3")?,
        tier_4: field("tier_4")?,
    })
}

fn is_header(record: &RawTaxonomyRecord) -> bool {
    record.unique_id.as_deref().map(str::trim) == Some(HEADER_ROW_ID)
}
