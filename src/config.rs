//! YAML configuration for the IABC classifier.
//!
//! One file describes every stage: where the taxonomy and the persisted
//! domain index live, how to reach the two providers, and the pipeline
//! tuning knobs. Provider keys are never read from this file; see
//! [`Secrets`](crate::Secrets).
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! log_level: "info"
//!
//! taxonomy:
//!   path: "data/taxonomy.json"
//!
//! index:
//!   dir: "data/index"
//!
//! embedding:
//!   mode: "api"
//!   model_name: "text-embedding-3-small"
//!   api_provider: "openai"
//!
//! generative:
//!   model_name: "gpt-4o-mini"
//!   temperature: 0.1
//!
//! classifier:
//!   max_results: 2
//!   profile_mode: "generative_with_heuristic_fallback"
//!   gate:
//!     max_in_flight: 8
//!     call_timeout: 30000
//!
//! limits:
//!   max_input_bytes: 1048576
//! ```
//!
//! Relative paths are resolved against the directory of the file they were
//! loaded from.

use std::fs;
use std::path::{Path, PathBuf};

use classifier::ClassifierConfig;
use generative::GenerativeConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct IabcConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Filter directive for the binaries' subscriber, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub taxonomy: TaxonomyYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    /// Embedding provider used by domain detection and index builds.
    #[serde(default)]
    pub embedding: SemanticConfig,

    /// Completion provider used for subcategories and profile hints.
    #[serde(default)]
    pub generative: GenerativeConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub limits: LimitsYamlConfig,
}

impl IabcConfig {
    /// Load a YAML configuration file from the given path.
    ///
    /// Relative taxonomy and index paths are anchored at the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: IabcConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Anchor relative paths at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.taxonomy.path.is_relative() {
            self.taxonomy.path = base.join(&self.taxonomy.path);
        }
        if self.index.dir.is_relative() {
            self.index.dir = base.join(&self.index.dir);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.taxonomy.validate()?;
        self.index.validate()?;
        self.validate_embedding()?;
        self.validate_generative()?;
        self.classifier
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("classifier: {err}")))?;
        self.limits.validate()?;

        Ok(())
    }

    fn validate_embedding(&self) -> Result<(), ConfigLoadError> {
        let valid_modes = ["api", "stub"];
        if !valid_modes.contains(&self.embedding.mode.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "embedding.mode must be one of: {valid_modes:?}"
            )));
        }
        if self.embedding.mode == "api"
            && self
                .embedding
                .api_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigLoadError::Validation(
                "embedding.api_url is required in api mode".to_string(),
            ));
        }
        if self.embedding.mode == "stub" && self.embedding.stub_dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.stub_dimension must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_generative(&self) -> Result<(), ConfigLoadError> {
        if self.generative.api_url.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "generative.api_url must not be empty".to_string(),
            ));
        }
        if self.generative.model_name.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "generative.model_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IabcConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            log_level: default_log_level(),
            taxonomy: TaxonomyYamlConfig::default(),
            index: IndexYamlConfig::default(),
            embedding: SemanticConfig::default(),
            generative: GenerativeConfig::default(),
            classifier: ClassifierConfig::default(),
            limits: LimitsYamlConfig::default(),
        }
    }
}

/// Taxonomy source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyYamlConfig {
    /// JSON records produced by the offline converter.
    #[serde(default = "default_taxonomy_path")]
    pub path: PathBuf,
}

impl TaxonomyYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "taxonomy.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TaxonomyYamlConfig {
    fn default() -> Self {
        Self {
            path: default_taxonomy_path(),
        }
    }
}

/// Domain index configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexYamlConfig {
    /// Directory holding the vector and domain artifacts.
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.dir.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "index.dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
        }
    }
}

/// Process-level input limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsYamlConfig {
    /// Largest input accepted by [`check_input`](crate::check_input).
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
}

impl LimitsYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_input_bytes == 0 {
            return Err(ConfigLoadError::Validation(
                "limits.max_input_bytes must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LimitsYamlConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from("data/taxonomy.json")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("data/index")
}

fn default_max_input_bytes() -> usize {
    1024 * 1024 // 1MB
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifier::ProfileMode;
    use std::time::Duration;

    #[test]
    fn minimal_yaml_uses_defaults() {
        let config = IabcConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(config, IabcConfig::default());
        assert_eq!(config.classifier.max_results, 2);
        assert_eq!(config.generative.model_name, "gpt-4o-mini");
        assert_eq!(config.limits.max_input_bytes, 1024 * 1024);
    }

    #[test]
    fn sections_override_defaults() {
        let yaml = r#"
version: "1"
name: "staging"
taxonomy:
  path: "/srv/iabc/taxonomy.json"
embedding:
  mode: "stub"
  stub_dimension: 64
classifier:
  max_results: 3
  profile_mode: "heuristic"
  tier1_keyword_fallback: true
  gate:
    max_in_flight: 2
    call_timeout: 1500
"#;
        let config = IabcConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("staging"));
        assert_eq!(config.taxonomy.path, PathBuf::from("/srv/iabc/taxonomy.json"));
        assert_eq!(config.embedding.mode, "stub");
        assert_eq!(config.embedding.stub_dimension, 64);
        assert_eq!(config.classifier.max_results, 3);
        assert_eq!(config.classifier.profile_mode, ProfileMode::Heuristic);
        assert!(config.classifier.tier1_keyword_fallback);
        assert_eq!(config.classifier.gate.max_in_flight, 2);
        assert_eq!(config.classifier.gate.call_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn shipped_example_parses() {
        let config = IabcConfig::from_yaml(include_str!("../iabc.example.yaml")).unwrap();
        assert_eq!(
            config.classifier.profile_mode,
            ProfileMode::GenerativeWithHeuristicFallback
        );
        assert_eq!(config.embedding.mode, "api");
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = IabcConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn invalid_sections_are_rejected() {
        let cases = [
            "version: \"1\"\nembedding:\n  mode: \"onnx\"\n",
            "version: \"1\"\nembedding:\n  mode: \"stub\"\n  stub_dimension: 0\n",
            "version: \"1\"\ngenerative:\n  model_name: \" \"\n",
            "version: \"1\"\nclassifier:\n  max_results: 0\n",
            "version: \"1\"\nlimits:\n  max_input_bytes: 0\n",
        ];
        for yaml in cases {
            let err = IabcConfig::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, ConfigLoadError::Validation(_)), "{yaml}");
        }
    }

    #[test]
    fn api_keys_in_yaml_are_not_serialized_back() {
        let yaml = "version: \"1\"\ngenerative:\n  api_auth_header: \"Bearer sk-leak\"\n";
        let config = IabcConfig::from_yaml(yaml).unwrap();
        let out = serde_yaml::to_string(&config).unwrap();
        assert!(!out.contains("sk-leak"));
    }

    #[test]
    fn from_file_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iabc.yaml");
        fs::write(
            &path,
            "version: \"1\"\ntaxonomy:\n  path: \"taxonomy.json\"\nindex:\n  dir: \"/abs/index\"\n",
        )
        .unwrap();

        let config = IabcConfig::from_file(&path).unwrap();
        assert_eq!(config.taxonomy.path, dir.path().join("taxonomy.json"));
        assert_eq!(config.index.dir, PathBuf::from("/abs/index"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = IabcConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }
}
