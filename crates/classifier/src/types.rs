use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use taxonomy::TaxonomyEntry;

/// Where a detected domain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DomainSource {
    /// Nearest neighbour in the embedding index.
    #[default]
    Embedding,
    /// Keyword rule table, used only when the embedding path failed.
    Keywords,
}

/// Best-matching top-level domain for a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainMatch {
    pub domain: String,
    /// Cosine similarity for embedding matches, keyword share for fallbacks.
    pub confidence: f32,
    #[serde(default)]
    pub source: DomainSource,
}

impl DomainMatch {
    pub fn embedding(domain: impl Into<String>, confidence: f32) -> Self {
        Self {
            domain: domain.into(),
            confidence,
            source: DomainSource::Embedding,
        }
    }

    pub fn keywords(domain: impl Into<String>, confidence: f32) -> Self {
        Self {
            domain: domain.into(),
            confidence,
            source: DomainSource::Keywords,
        }
    }
}

/// A taxonomy entry selected for the text, with canonical id and tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationCandidate {
    pub id: String,
    pub name: String,
    /// Provider-supplied confidence in `[0, 1]`.
    pub confidence: f32,
    pub tier_1: String,
    pub tier_2: Option<String>,
    pub tier_3: Option<String>,
    pub tier_4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ClassificationCandidate {
    /// Candidate carrying the canonical fields of `entry`.
    pub fn from_entry(entry: &TaxonomyEntry, confidence: f32, reasoning: Option<String>) -> Self {
        Self {
            id: entry.unique_id().to_string(),
            name: entry.name().to_string(),
            confidence,
            tier_1: entry.tier_1().to_string(),
            tier_2: entry.tier_2().map(str::to_string),
            tier_3: entry.tier_3().map(str::to_string),
            tier_4: entry.tier_4().map(str::to_string),
            reasoning,
        }
    }
}

/// Reader age bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AgeRange {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-49")]
    From35To49,
    #[serde(rename = "50+")]
    Over50,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl AgeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::From18To24 => "18-24",
            AgeRange::From25To34 => "25-34",
            AgeRange::From35To49 => "35-49",
            AgeRange::Over50 => "50+",
            AgeRange::Unknown => "unknown",
        }
    }

    /// Bucket holding `age`. Ages under 18 land in the youngest bucket.
    pub fn from_age(age: f32) -> Self {
        if !age.is_finite() || age <= 0.0 {
            AgeRange::Unknown
        } else if age < 25.0 {
            AgeRange::From18To24
        } else if age < 35.0 {
            AgeRange::From25To34
        } else if age < 50.0 {
            AgeRange::From35To49
        } else {
            AgeRange::Over50
        }
    }

    /// Map free-form text such as `"30-45"`, `"55+"` or
    /// `"young_adult_25-35"` onto a bucket by the midpoint of the first two
    /// numbers found. Text without numbers is [`AgeRange::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let numbers: Vec<f32> = raw
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse::<f32>().ok())
            .take(2)
            .collect();
        match numbers.as_slice() {
            [low, high] => AgeRange::from_age((low + high) / 2.0),
            [single] => AgeRange::from_age(*single),
            _ => AgeRange::Unknown,
        }
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Technical affinity score, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Geekiness(u8);

impl Geekiness {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const NEUTRAL: Geekiness = Geekiness(5);

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Geekiness {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl TryFrom<u8> for Geekiness {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("geekiness {value} is outside 1..=10"))
    }
}

impl From<Geekiness> for u8 {
    fn from(g: Geekiness) -> Self {
        g.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sophistication {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl Sophistication {
    /// Case-insensitive parse; `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Sophistication::Basic),
            "intermediate" => Some(Sophistication::Intermediate),
            "advanced" => Some(Sophistication::Advanced),
            _ => None,
        }
    }
}

/// Dominant script of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Japanese,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    Heuristic,
    Generative,
    #[default]
    Neutral,
}

/// Lightweight estimate of the likely reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfileEstimate {
    pub age_range: AgeRange,
    pub geekiness: Geekiness,
    pub sophistication: Sophistication,
    pub language: Language,
    /// Interest and behaviour tags, deduplicated, in discovery order.
    pub tags: Vec<String>,
    pub confidence: f32,
    pub source: ProfileSource,
}

impl UserProfileEstimate {
    /// Defaults used when no estimate could be made.
    pub fn neutral() -> Self {
        Self {
            age_range: AgeRange::Unknown,
            geekiness: Geekiness::NEUTRAL,
            sophistication: Sophistication::Basic,
            language: Language::Unknown,
            tags: Vec::new(),
            confidence: 0.0,
            source: ProfileSource::Neutral,
        }
    }
}

impl Default for UserProfileEstimate {
    fn default() -> Self {
        Self::neutral()
    }
}

/// How the subcategory stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier2Status {
    /// At least one provider item reconciled onto the taxonomy.
    Resolved,
    /// The reply parsed but nothing in it reconciled.
    NoneResolved,
    /// The domain has no taxonomy entries to choose from.
    Skipped,
    ProviderFailed,
    TimedOut,
    /// The reply was not JSON or not a category list.
    ParseFailed,
}

impl Tier2Status {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Tier2Status::ProviderFailed | Tier2Status::TimedOut | Tier2Status::ParseFailed
        )
    }
}

/// Result of the subcategory stage. Never an error; failures are tagged.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier2Outcome {
    pub status: Tier2Status,
    pub candidates: Vec<ClassificationCandidate>,
    /// `user_profile` object from the same reply, when one was requested and present.
    pub profile_hints: Option<JsonValue>,
}

impl Tier2Outcome {
    pub fn empty(status: Tier2Status) -> Self {
        Self {
            status,
            candidates: Vec::new(),
            profile_hints: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodTag {
    EmbeddingOnly,
    Hybrid,
    KeywordFallback,
}

impl MethodTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodTag::EmbeddingOnly => "embedding-only",
            MethodTag::Hybrid => "hybrid",
            MethodTag::KeywordFallback => "keyword-fallback",
        }
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of one classification pass. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub domain: String,
    pub domain_confidence: f32,
    pub candidates: Vec<ClassificationCandidate>,
    pub profile: UserProfileEstimate,
    #[serde(rename = "elapsed_ms", with = "semantic::serde_millis")]
    pub elapsed: Duration,
    pub method: MethodTag,
    pub tier2_status: Tier2Status,
    pub profile_source: ProfileSource,
}
