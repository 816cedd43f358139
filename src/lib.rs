//! Workspace umbrella crate for the IABC hybrid classifier.
//!
//! This crate wires the pipeline crates together from one YAML file:
//! it loads the taxonomy catalog and the persisted domain index, builds the
//! embedding and completion providers with keys taken from the environment,
//! and hands back a ready [`Classifier`]. The two binaries (`iabc` and
//! `iabc-build-index`) are thin wrappers over [`bootstrap`] and
//! [`build_index`].

pub mod config;

pub use crate::config::{
    ConfigLoadError, IabcConfig, IndexYamlConfig, LimitsYamlConfig, TaxonomyYamlConfig,
};
pub use classifier::{
    ClassificationCandidate, ClassificationResult, Classifier, ClassifierConfig, ClassifyError,
    DomainMatch, LazyClassifier, MethodTag, ProfileMode, ProfileSource, Tier2Status,
    UserProfileEstimate,
};
pub use generative::{Completer, CompletionRequest, GenerativeConfig, GenerativeError};
pub use index::{EmbeddingIndex, IndexError, IndexStore};
pub use semantic::{Embedder, SemanticConfig, SemanticError, StubEmbedder};
pub use taxonomy::{TaxonomyCatalog, TaxonomyError, TaxonomySource};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use generative::OpenAiCompleter;
use semantic::embedder_from_config;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "IABC_CONFIG";
/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "iabc.yaml";
/// Completion provider key; also used for embeddings unless overridden.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Embedding provider key.
pub const EMBEDDING_API_KEY_ENV: &str = "IABC_EMBEDDING_API_KEY";

/// Errors raised while assembling the pipeline. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("taxonomy: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("domain index: {0}")]
    Index(#[from] IndexError),

    #[error("embedding provider: {0}")]
    Embedding(#[from] SemanticError),

    #[error("completion provider: {0}")]
    Generative(#[from] GenerativeError),

    #[error("classifier: {0}")]
    Classifier(#[from] ClassifyError),

    #[error("missing provider key: set {0}")]
    MissingSecret(&'static str),
}

/// Input rejected before classification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("input is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Provider keys. Never part of [`IabcConfig`] and never logged.
#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub embedding_api_key: Option<String>,
}

impl Secrets {
    /// Read keys from the process environment. Blank values count as unset.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_blank_env(OPENAI_API_KEY_ENV),
            embedding_api_key: non_blank_env(EMBEDDING_API_KEY_ENV),
        }
    }

    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn with_embedding_api_key(mut self, key: impl Into<String>) -> Self {
        self.embedding_api_key = Some(key.into());
        self
    }

    fn embedding_key(&self) -> Option<&str> {
        self.embedding_api_key
            .as_deref()
            .or(self.openai_api_key.as_deref())
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Path of the config file: `$IABC_CONFIG`, else [`DEFAULT_CONFIG_PATH`].
pub fn config_path_from_env() -> PathBuf {
    non_blank_env(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Install the JSON subscriber used by the binaries.
///
/// `RUST_LOG` wins over `default_level`. Output goes to stderr so stdout
/// stays clean for results. Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .json()
        .try_init();
}

/// Reject inputs above `limits.max_input_bytes`.
pub fn check_input<'a>(text: &'a str, limits: &LimitsYamlConfig) -> Result<&'a str, InputError> {
    check_len(text.len(), limits)?;
    Ok(text)
}

/// Raw bytes to text. The size limit is checked before decoding, so a read
/// capped mid-character still reports the size.
pub fn decode_input(bytes: Vec<u8>, limits: &LimitsYamlConfig) -> Result<String, InputError> {
    check_len(bytes.len(), limits)?;
    String::from_utf8(bytes).map_err(|e| InputError::InvalidUtf8(e.utf8_error().to_string()))
}

fn check_len(size: usize, limits: &LimitsYamlConfig) -> Result<(), InputError> {
    if size > limits.max_input_bytes {
        return Err(InputError::TooLarge {
            size,
            limit: limits.max_input_bytes,
        });
    }
    Ok(())
}

pub fn load_catalog(config: &IabcConfig) -> Result<TaxonomyCatalog, BootstrapError> {
    let source = TaxonomySource::json_file(&config.taxonomy.path);
    Ok(TaxonomyCatalog::load(&source)?)
}

pub fn load_index(config: &IabcConfig) -> Result<EmbeddingIndex, BootstrapError> {
    let store = IndexStore::new(&config.index.dir);
    match EmbeddingIndex::load(&store) {
        Ok(index) => Ok(index),
        Err(err @ IndexError::NotFound(_)) => {
            warn!(
                dir = %config.index.dir.display(),
                "index_missing_run_iabc_build_index"
            );
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Embedding provider for `config.embedding`.
///
/// In `api` mode a key is injected unless the config already carries an
/// auth header. The OpenAI payload shape requires one.
pub fn build_embedder(
    config: &IabcConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn Embedder>, BootstrapError> {
    let mut embedding = config.embedding.clone();
    if embedding.mode == "api" && embedding.api_auth_header.is_none() {
        match secrets.embedding_key() {
            Some(key) => embedding = embedding.with_api_key(key),
            None if embedding.provider_name() == "openai" => {
                return Err(BootstrapError::MissingSecret(EMBEDDING_API_KEY_ENV));
            }
            None => {}
        }
    }
    Ok(embedder_from_config(&embedding)?)
}

pub fn build_completer(
    config: &IabcConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn Completer>, BootstrapError> {
    let mut generative = config.generative.clone();
    if generative.api_auth_header.is_none() {
        let key = secrets
            .openai_api_key
            .as_deref()
            .ok_or(BootstrapError::MissingSecret(OPENAI_API_KEY_ENV))?;
        generative = generative.with_api_key(key);
    }
    Ok(Arc::new(OpenAiCompleter::new(generative)?))
}

/// Build a [`Classifier`] from config files on disk and the given providers.
pub fn bootstrap_with(
    config: &IabcConfig,
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
) -> Result<Classifier, BootstrapError> {
    let catalog = load_catalog(config)?;
    let index = load_index(config)?;
    info!(
        entries = catalog.len(),
        domains = index.len(),
        dimension = index.dimension(),
        embedding_model = embedder.model_name(),
        completion_model = completer.model_name(),
        "bootstrap_complete"
    );
    Ok(Classifier::new(
        Arc::new(catalog),
        Arc::new(index),
        embedder,
        completer,
        config.classifier.clone(),
    )?)
}

/// Build a [`Classifier`] with providers from `config` and keys from the environment.
pub fn bootstrap(config: &IabcConfig) -> Result<Classifier, BootstrapError> {
    let secrets = Secrets::from_env();
    let embedder = build_embedder(config, &secrets)?;
    let completer = build_completer(config, &secrets)?;
    bootstrap_with(config, embedder, completer)
}

/// A [`LazyClassifier`] that runs [`bootstrap`] on first use.
pub fn lazy_classifier(config: IabcConfig) -> LazyClassifier {
    let config = Arc::new(config);
    LazyClassifier::new(move || {
        let config = Arc::clone(&config);
        async move { bootstrap(&config).map_err(|err| ClassifyError::Init(err.to_string())) }
    })
}

/// Embed every domain description of the configured taxonomy and persist
/// the result under `config.index.dir`.
pub async fn build_index(
    config: &IabcConfig,
    embedder: &dyn Embedder,
) -> Result<EmbeddingIndex, BootstrapError> {
    let catalog = load_catalog(config)?;
    let descriptions = catalog.domain_descriptions();
    let index = EmbeddingIndex::build(&descriptions, embedder).await?;
    index.persist(&IndexStore::new(&config.index.dir))?;
    Ok(index)
}
