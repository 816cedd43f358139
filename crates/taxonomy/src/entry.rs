use serde::{Deserialize, Serialize};

use crate::error::TaxonomyError;

/// Deepest tier a taxonomy path can reach.
pub const MAX_DEPTH: u8 = 4;

/// Untyped taxonomy row as produced by the offline converter.
///
/// Every field is optional here; [`TaxonomyEntry::try_from`] decides what is
/// actually required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTaxonomyRecord {
    pub unique_id: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    pub name: Option<String>,
    pub tier_1: Option<String>,
    pub tier_2: Option<String>,
    pub tier_3: Option<String>,
    pub tier_4: Option<String>,
}

/// A validated node of the taxonomy tree.
///
/// The tier fields form a path from the root: `tier_1` is always present and
/// `tier_n` may only be set when `tier_{n-1}` is. The deepest set tier is the
/// entry's depth, so an entry with only `tier_1` is a top-level domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTaxonomyRecord", into = "RawTaxonomyRecord")]
pub struct TaxonomyEntry {
    unique_id: String,
    parent: Option<String>,
    name: String,
    tiers: [Option<String>; 4],
    depth: u8,
}

impl TaxonomyEntry {
    /// Build an entry, enforcing the path invariant.
    pub fn new(
        unique_id: impl Into<String>,
        name: impl Into<String>,
        tiers: [Option<String>; 4],
    ) -> Result<Self, TaxonomyError> {
        Self::with_parent(unique_id, None, name, tiers)
    }

    /// Same as [`TaxonomyEntry::new`] but records the parent id.
    pub fn with_parent(
        unique_id: impl Into<String>,
        parent: Option<String>,
        name: impl Into<String>,
        tiers: [Option<String>; 4],
    ) -> Result<Self, TaxonomyError> {
        let unique_id = unique_id.into().trim().to_string();
        if unique_id.is_empty() {
            return Err(TaxonomyError::invalid("<blank>", "unique_id is empty"));
        }
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(TaxonomyError::invalid(unique_id, "name is empty"));
        }

        let tiers = tiers.map(clean);
        if tiers[0].is_none() {
            return Err(TaxonomyError::invalid(unique_id, "tier_1 is empty"));
        }

        let mut depth = 0u8;
        let mut gap = false;
        for (idx, tier) in tiers.iter().enumerate() {
            match tier {
                Some(_) if gap => {
                    return Err(TaxonomyError::invalid(
                        unique_id,
                        format!("tier_{} set without tier_{}", idx + 1, idx),
                    ));
                }
                Some(_) => depth = idx as u8 + 1,
                None => gap = true,
            }
        }

        Ok(Self {
            unique_id,
            parent: parent.and_then(|p| clean(Some(p))),
            name,
            tiers,
            depth,
        })
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the top-level domain this entry belongs to.
    pub fn tier_1(&self) -> &str {
        // Validated non-empty at construction.
        self.tiers[0].as_deref().unwrap_or_default()
    }

    pub fn tier_2(&self) -> Option<&str> {
        self.tiers[1].as_deref()
    }

    pub fn tier_3(&self) -> Option<&str> {
        self.tiers[2].as_deref()
    }

    pub fn tier_4(&self) -> Option<&str> {
        self.tiers[3].as_deref()
    }

    /// Tier value at `depth` (1-based).
    pub fn tier(&self, depth: u8) -> Option<&str> {
        match depth {
            1..=MAX_DEPTH => self.tiers[depth as usize - 1].as_deref(),
            _ => None,
        }
    }

    /// Depth of the deepest non-null tier, in `1..=4`.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// True for top-level domains (tier_2..4 all null).
    pub fn is_domain(&self) -> bool {
        self.depth == 1
    }
}

impl TryFrom<RawTaxonomyRecord> for TaxonomyEntry {
    type Error = TaxonomyError;

    fn try_from(raw: RawTaxonomyRecord) -> Result<Self, Self::Error> {
        let RawTaxonomyRecord {
            unique_id,
            parent,
            name,
            tier_1,
            tier_2,
            tier_3,
            tier_4,
        } = raw;
        let unique_id = unique_id.unwrap_or_default();
        let name = name.unwrap_or_default();
        TaxonomyEntry::with_parent(unique_id, parent, name, [tier_1, tier_2, tier_3, tier_4])
    }
}

impl From<TaxonomyEntry> for RawTaxonomyRecord {
    fn from(entry: TaxonomyEntry) -> Self {
        let [tier_1, tier_2, tier_3, tier_4] = entry.tiers;
        RawTaxonomyRecord {
            unique_id: Some(entry.unique_id),
            parent: entry.parent,
            name: Some(entry.name),
            tier_1,
            tier_2,
            tier_3,
            tier_4,
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
