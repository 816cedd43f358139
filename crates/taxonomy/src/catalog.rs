use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::entry::TaxonomyEntry;
use crate::error::TaxonomyError;
use crate::source::TaxonomySource;

const MAX_MAIN_CATEGORIES: usize = 10;
const MAX_SUBCATEGORIES: usize = 15;
const MAX_SPECIFIC_TOPICS: usize = 10;

/// Immutable, ordered collection of taxonomy entries.
///
/// Built once at startup and shared read-only (typically behind an `Arc`).
#[derive(Debug, Clone)]
pub struct TaxonomyCatalog {
    entries: Vec<TaxonomyEntry>,
    by_id: HashMap<String, usize>,
    domains: Vec<String>,
}

impl TaxonomyCatalog {
    /// Parse `source` and build a catalog.
    pub fn load(source: &TaxonomySource) -> Result<Self, TaxonomyError> {
        let entries = source.read_entries()?;
        let catalog = Self::from_entries(entries)?;
        tracing::info!(
            entries = catalog.len(),
            domains = catalog.domains.len(),
            "taxonomy_loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from already validated entries, keeping their order.
    pub fn from_entries(entries: Vec<TaxonomyEntry>) -> Result<Self, TaxonomyError> {
        if entries.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut by_id = HashMap::with_capacity(entries.len());
        let mut seen_domains = HashSet::new();
        let mut domains = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            if by_id.insert(entry.unique_id().to_string(), idx).is_some() {
                return Err(TaxonomyError::DuplicateId(entry.unique_id().to_string()));
            }
            if seen_domains.insert(entry.tier_1().to_string()) {
                domains.push(entry.tier_1().to_string());
            }
        }

        Ok(Self {
            entries,
            by_id,
            domains,
        })
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TaxonomyEntry> {
        self.by_id.get(id.trim()).map(|&idx| &self.entries[idx])
    }

    /// Entries whose tier_2..tier_4 are all null, in load order.
    pub fn tier1_entries(&self) -> Vec<&TaxonomyEntry> {
        self.entries.iter().filter(|e| e.is_domain()).collect()
    }

    /// Distinct tier_1 names in first-seen order.
    ///
    /// Differs from [`tier1_entries`](Self::tier1_entries) when a source has
    /// subcategories for a domain that has no explicit depth-1 row.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Every entry belonging to `domain`, at any depth. Empty for unknown
    /// domains.
    pub fn subset(&self, domain: &str) -> DomainSubset<'_> {
        let entries = self
            .entries
            .iter()
            .filter(|e| e.tier_1() == domain)
            .collect();
        DomainSubset {
            domain: domain.to_string(),
            entries,
        }
    }

    /// Case-insensitive name lookup across the whole catalog.
    ///
    /// An exact match wins; otherwise the first entry whose name contains
    /// `name` is returned. Blank input never matches.
    pub fn find_by_name(&self, name: &str) -> Option<&TaxonomyEntry> {
        find_by_name(self.entries.iter(), name)
    }

    /// Rich text description of `domain` used to embed it.
    ///
    /// Returns `None` for unknown domains.
    pub fn describe_domain(&self, domain: &str) -> Option<String> {
        let subset = self.subset(domain);
        if subset.is_empty() {
            return None;
        }

        let mut out = format!("Domain: {domain}");
        let parts = [
            ("Main categories", 2, MAX_MAIN_CATEGORIES),
            ("Subcategories", 3, MAX_SUBCATEGORIES),
            ("Specific topics", 4, MAX_SPECIFIC_TOPICS),
        ];
        for (label, depth, cap) in parts {
            let names = distinct_tier_values(&subset, depth, cap);
            if !names.is_empty() {
                out.push_str(&format!(". {label}: {}", names.join(", ")));
            }
        }
        Some(out)
    }

    /// `(domain, description)` pairs for every domain, in domain order.
    pub fn domain_descriptions(&self) -> Vec<(String, String)> {
        self.domains
            .iter()
            .filter_map(|d| self.describe_domain(d).map(|desc| (d.clone(), desc)))
            .collect()
    }
}

/// Borrowed view over the entries of one domain.
#[derive(Debug, Clone)]
pub struct DomainSubset<'a> {
    domain: String,
    entries: Vec<&'a TaxonomyEntry>,
}

impl<'a> DomainSubset<'a> {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn entries(&self) -> &[&'a TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a TaxonomyEntry> {
        let id = id.trim();
        self.entries.iter().copied().find(|e| e.unique_id() == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Same matching rules as [`TaxonomyCatalog::find_by_name`], restricted
    /// to this subset.
    pub fn find_by_name(&self, name: &str) -> Option<&'a TaxonomyEntry> {
        find_by_name(self.entries.iter().copied(), name)
    }

    /// Entries sorted by `(depth, id)` with numeric-aware id ordering.
    pub fn sorted(&self) -> Vec<&'a TaxonomyEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| compare_ids(a.unique_id(), b.unique_id()))
        });
        sorted
    }

    /// One `id:name` line per entry, in [`sorted`](Self::sorted) order.
    pub fn prompt_lines(&self) -> String {
        self.sorted()
            .into_iter()
            .map(|e| format!("{}:{}", e.unique_id(), e.name()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn find_by_name<'a, I>(entries: I, name: &str) -> Option<&'a TaxonomyEntry>
where
    I: Iterator<Item = &'a TaxonomyEntry>,
{
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let mut contains = None;
    for entry in entries {
        let candidate = entry.name().to_lowercase();
        if candidate == needle {
            return Some(entry);
        }
        if contains.is_none() && candidate.contains(&needle) {
            contains = Some(entry);
        }
    }
    contains
}

/// Numeric ids compare as numbers and sort before non-numeric ids.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn distinct_tier_values(subset: &DomainSubset<'_>, depth: u8, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in subset.entries() {
        if let Some(value) = entry.tier(depth) {
            if seen.insert(value) {
                out.push(value.to_string());
                if out.len() == cap {
                    break;
                }
            }
        }
    }
    out
}
