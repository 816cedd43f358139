use semantic::resilience::GateConfig;
use serde::{Deserialize, Serialize};

use crate::ClassifyError;

/// How the reader profile is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    /// Lexical rules only; no profile fields are requested from the provider.
    Heuristic,
    /// Profile fields from the subcategory reply, neutral defaults otherwise.
    #[default]
    Generative,
    /// Profile fields from the subcategory reply, lexical rules otherwise.
    GenerativeWithHeuristicFallback,
}

impl ProfileMode {
    /// Whether the subcategory prompt should ask for a `user_profile` object.
    pub fn wants_generative(&self) -> bool {
        !matches!(self, ProfileMode::Heuristic)
    }
}

/// Tuning knobs for the classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Characters of input sent to the embedding provider.
    pub tier1_prefix_chars: usize,
    /// Characters of input sent to the completion provider.
    pub tier2_text_chars: usize,
    /// Candidates kept in the final result.
    pub max_results: usize,
    pub profile_mode: ProfileMode,
    /// Use the keyword rule table when the embedding call fails.
    pub tier1_keyword_fallback: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Confidence given to provider items whose own value is missing or out of range.
    pub default_confidence: f32,
    pub gate: GateConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tier1_prefix_chars: 8000,
            tier2_text_chars: 2000,
            max_results: 2,
            profile_mode: ProfileMode::default(),
            tier1_keyword_fallback: false,
            temperature: 0.1,
            max_tokens: 1000,
            default_confidence: 0.75,
            gate: GateConfig::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_profile_mode(mut self, mode: ProfileMode) -> Self {
        self.profile_mode = mode;
        self
    }

    pub fn with_keyword_fallback(mut self, enabled: bool) -> Self {
        self.tier1_keyword_fallback = enabled;
        self
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.tier1_prefix_chars == 0 {
            return Err(ClassifyError::InvalidConfig(
                "tier1_prefix_chars must be greater than zero".into(),
            ));
        }
        if self.tier2_text_chars == 0 {
            return Err(ClassifyError::InvalidConfig(
                "tier2_text_chars must be greater than zero".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(ClassifyError::InvalidConfig(
                "max_results must be greater than zero".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ClassifyError::InvalidConfig(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ClassifyError::InvalidConfig(
                "max_tokens must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ClassifyError::InvalidConfig(format!(
                "default_confidence {} is outside 0.0..=1.0",
                self.default_confidence
            )));
        }
        if self.gate.max_in_flight == 0 {
            return Err(ClassifyError::InvalidConfig(
                "gate.max_in_flight must be greater than zero".into(),
            ));
        }
        if self.gate.call_timeout.is_zero() {
            return Err(ClassifyError::InvalidConfig(
                "gate.call_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
