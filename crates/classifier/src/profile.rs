//! Reader profile estimation.
//!
//! Two sources produce the same [`UserProfileEstimate`] shape: lexical rules
//! over the text, and the `user_profile` object returned alongside the
//! subcategory reply. Provider values are validated field by field; nothing
//! here returns an error.

use serde_json::{Map, Value as JsonValue};

use crate::config::ProfileMode;
use crate::rules::{RuleTable, Tone};
use crate::types::{
    AgeRange, Geekiness, Language, ProfileSource, Sophistication, UserProfileEstimate,
};

/// Confidence attached to rule-based estimates and to provider profiles
/// that omit their own.
const DEFAULT_PROFILE_CONFIDENCE: f32 = 0.75;

/// Fields the provider may fill; an object with none of them is ignored.
const PROFILE_FIELDS: [&str; 5] = [
    "age_range",
    "geekiness_level",
    "sophistication",
    "interests",
    "behavioral_patterns",
];

/// Dominant script: kana/CJK ideographs against Latin letters.
pub fn detect_language(text: &str) -> Language {
    let mut cjk = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if is_cjk(c) {
            cjk += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    if cjk == 0 && latin == 0 {
        Language::Unknown
    } else if cjk > latin {
        Language::Japanese
    } else {
        Language::English
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{4E00}'..='\u{9FAF}' // CJK unified ideographs
    )
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileEstimator {
    mode: ProfileMode,
    rules: &'static RuleTable,
}

impl ProfileEstimator {
    pub fn new(mode: ProfileMode) -> Self {
        Self {
            mode,
            rules: RuleTable::builtin(),
        }
    }

    pub fn mode(&self) -> ProfileMode {
        self.mode
    }

    /// Estimate the reader of `text` in `domain`. `hints` is the provider's
    /// `user_profile` object, if any.
    pub fn estimate(
        &self,
        text: &str,
        domain: &str,
        hints: Option<&JsonValue>,
    ) -> UserProfileEstimate {
        match self.mode {
            ProfileMode::Heuristic => self.heuristic(text, domain),
            ProfileMode::Generative => hints
                .and_then(|h| from_generative(h, text))
                .unwrap_or_else(UserProfileEstimate::neutral),
            ProfileMode::GenerativeWithHeuristicFallback => hints
                .and_then(|h| from_generative(h, text))
                .unwrap_or_else(|| self.heuristic(text, domain)),
        }
    }

    /// Deterministic estimate from the rule table.
    pub fn heuristic(&self, text: &str, domain: &str) -> UserProfileEstimate {
        let lower = text.to_lowercase();
        let rules = self.rules;
        let tech = rules.technical_term_count(&lower);
        let base = rules.base_geekiness(domain) as i64;

        let boost = if rules.has_deep_technical_terms(&lower) {
            3
        } else if tech >= 5 {
            2
        } else if tech >= 2 {
            1
        } else {
            0
        };

        let sophistication = if rules.tone(&lower) == Tone::Informational && tech >= 3 {
            Sophistication::Advanced
        } else if tech >= 1 || text.split_whitespace().count() > 50 {
            Sophistication::Intermediate
        } else {
            Sophistication::Basic
        };

        UserProfileEstimate {
            age_range: rules.age_cue(&lower).unwrap_or_default(),
            geekiness: Geekiness::clamped(base + boost),
            sophistication,
            language: detect_language(text),
            tags: rules.tags(&lower),
            confidence: DEFAULT_PROFILE_CONFIDENCE,
            source: ProfileSource::Heuristic,
        }
    }
}

/// Validated profile from a provider `user_profile` object.
///
/// `None` when `hints` is not an object or carries no recognised field.
/// Language always comes from the text, since the provider is not asked.
pub fn from_generative(hints: &JsonValue, text: &str) -> Option<UserProfileEstimate> {
    let fields = hints.as_object()?;
    if !PROFILE_FIELDS.iter().any(|f| fields.contains_key(*f)) {
        return None;
    }

    let age_range = fields
        .get("age_range")
        .and_then(JsonValue::as_str)
        .map(AgeRange::parse)
        .unwrap_or_default();
    let geekiness = fields
        .get("geekiness_level")
        .and_then(as_number)
        .map(|g| Geekiness::clamped(g.round() as i64))
        .unwrap_or_default();
    let sophistication = fields
        .get("sophistication")
        .and_then(JsonValue::as_str)
        .and_then(Sophistication::parse)
        .unwrap_or_default();
    let confidence = fields
        .get("confidence")
        .and_then(as_number)
        .map(|c| c as f32)
        .filter(|c| (0.0..=1.0).contains(c))
        .unwrap_or(DEFAULT_PROFILE_CONFIDENCE);

    let mut tags = Vec::new();
    collect_tags(fields, "interests", &mut tags);
    collect_tags(fields, "behavioral_patterns", &mut tags);

    Some(UserProfileEstimate {
        age_range,
        geekiness,
        sophistication,
        language: detect_language(text),
        tags,
        confidence,
        source: ProfileSource::Generative,
    })
}

fn as_number(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn collect_tags(fields: &Map<String, JsonValue>, key: &str, tags: &mut Vec<String>) {
    let Some(items) = fields.get(key).and_then(JsonValue::as_array) else {
        return;
    };
    for tag in items.iter().filter_map(JsonValue::as_str) {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
}
