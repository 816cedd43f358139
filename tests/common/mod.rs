//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use iabc::{
    Classifier, Completer, CompletionRequest, Embedder, GenerativeError, IabcConfig,
    SemanticConfig, SemanticError, StubEmbedder,
};
use tempfile::TempDir;

pub const RAV4: &str = "The Toyota RAV4 hybrid is a family SUV with a smooth engine, \
                        good fuel economy and plenty of safety features. Among green vehicles \
                        and automotive body styles it stands out.";

pub const TAXONOMY_JSON: &str = include_str!("../fixtures/taxonomy.json");

pub const STUB_DIM: usize = 256;

pub const SUV_REPLY: &str = r#"```json
{"categories": [
  {"id": "x", "name": "SUV", "confidence": 0.9, "reasoning": "family SUV"},
  {"id": "18", "name": "Green Vehicle", "confidence": 0.7},
  {"id": "43", "name": "Air Travel", "confidence": 0.99}
 ],
 "user_profile": {"age_range": "30-45", "interests": ["automotive", "family_vehicles"],
                  "geekiness_level": 6, "sophistication": "intermediate",
                  "behavioral_patterns": ["researches before buying"], "confidence": 0.8}}
```"#;

/// A temp directory holding a taxonomy file, plus a config pointing at it.
pub struct Workspace {
    pub dir: TempDir,
    pub config: IabcConfig,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_taxonomy(TAXONOMY_JSON)
    }

    pub fn with_taxonomy(json: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let taxonomy = dir.path().join("taxonomy.json");
        fs::write(&taxonomy, json).unwrap();

        let mut config = IabcConfig {
            embedding: SemanticConfig::stub(STUB_DIM),
            ..IabcConfig::default()
        };
        config.taxonomy.path = taxonomy;
        config.index.dir = dir.path().join("index");
        Self { dir, config }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.config.index.dir.clone()
    }

    /// Build and persist the domain index with the stub embedder.
    pub async fn build_index(&self) {
        iabc::build_index(&self.config, stub().as_ref()).await.unwrap();
    }

    /// Index built, classifier assembled from disk.
    pub async fn classifier(&self, completer: Arc<dyn Completer>) -> Classifier {
        self.build_index().await;
        iabc::bootstrap_with(&self.config, stub(), completer).unwrap()
    }
}

pub fn stub() -> Arc<dyn Embedder> {
    Arc::new(StubEmbedder::new(STUB_DIM))
}

/// Replies with a fixed result and counts calls.
pub struct ScriptedCompleter {
    reply: Result<String, GenerativeError>,
    calls: AtomicUsize,
}

impl ScriptedCompleter {
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: GenerativeError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Embedding provider that is always unavailable.
pub struct DownEmbedder;

#[async_trait::async_trait]
impl Embedder for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Err(SemanticError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }

    fn model_name(&self) -> &str {
        "down"
    }
}
