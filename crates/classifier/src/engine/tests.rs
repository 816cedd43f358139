use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use generative::{CompletionRequest, GenerativeError};
use semantic::{SemanticError, StubEmbedder};
use taxonomy::TaxonomyEntry;

use crate::config::ProfileMode;
use crate::types::{
    AgeRange, MethodTag, ProfileSource, Sophistication, Tier2Status, UserProfileEstimate,
};
use crate::LazyClassifier;

const RAV4: &str = "The Toyota RAV4 hybrid is a family SUV with a smooth engine, \
                    good fuel economy and plenty of safety features. Among green vehicles \
                    and automotive body styles it stands out.";

fn entry(id: &str, name: &str, tiers: [Option<&str>; 4]) -> TaxonomyEntry {
    TaxonomyEntry::new(id, name, tiers.map(|t| t.map(str::to_string))).unwrap()
}

fn fixture_catalog() -> Arc<TaxonomyCatalog> {
    Arc::new(
        TaxonomyCatalog::from_entries(vec![
            entry("1", "Automotive", [Some("Automotive"), None, None, None]),
            entry(
                "2",
                "Auto Body Styles",
                [Some("Automotive"), Some("Auto Body Styles"), None, None],
            ),
            entry(
                "6",
                "SUV",
                [Some("Automotive"), Some("Auto Body Styles"), Some("SUV"), None],
            ),
            entry("16", "Auto Type", [Some("Automotive"), Some("Auto Type"), None, None]),
            entry(
                "18",
                "Green Vehicles",
                [Some("Automotive"), Some("Auto Type"), Some("Green Vehicles"), None],
            ),
            entry("42", "Travel", [Some("Travel"), None, None, None]),
            entry(
                "43",
                "Air Travel",
                [Some("Travel"), Some("Air Travel"), None, None],
            ),
            entry("44", "Beach Travel", [Some("Travel"), Some("Beach Travel"), None, None]),
        ])
        .unwrap(),
    )
}

fn stub() -> Arc<StubEmbedder> {
    Arc::new(StubEmbedder::new(256))
}

async fn fixture_index(catalog: &TaxonomyCatalog, embedder: &StubEmbedder) -> Arc<EmbeddingIndex> {
    let descriptions = catalog.domain_descriptions();
    Arc::new(EmbeddingIndex::build(&descriptions, embedder).await.unwrap())
}

/// Returns a fixed reply and counts calls.
struct MockCompleter {
    reply: Result<String, GenerativeError>,
    calls: AtomicUsize,
    last: Mutex<Option<CompletionRequest>>,
}

impl MockCompleter {
    fn new(reply: Result<&str, GenerativeError>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }
}

#[async_trait::async_trait]
impl Completer for MockCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

struct DownEmbedder;

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

async fn classifier_with(
    completer: Arc<MockCompleter>,
    config: ClassifierConfig,
) -> Classifier {
    let catalog = fixture_catalog();
    let embedder = stub();
    let index = fixture_index(&catalog, &embedder).await;
    Classifier::new(catalog, index, embedder, completer, config).unwrap()
}

#[tokio::test]
async fn hybrid_pipeline_resolves_candidates() {
    let completer = MockCompleter::new(Ok(r#"```json
{"categories": [
  {"id": "999", "name": "SUV", "confidence": 0.92, "reasoning": "compact SUV"},
  {"id": "18", "name": "Green Vehicle", "confidence": 0.81},
  {"id": "43", "name": "Air Travel", "confidence": 0.99}
 ],
 "user_profile": {"age_range": "30-45", "interests": ["automotive"], "geekiness_level": 6,
                  "sophistication": "intermediate", "confidence": 0.8}}
```"#));
    let classifier = classifier_with(completer.clone(), ClassifierConfig::default()).await;

    let result = classifier.classify(RAV4).await.unwrap();
    assert_eq!(result.domain, "Automotive");
    assert_eq!(result.method, MethodTag::Hybrid);
    assert_eq!(result.tier2_status, Tier2Status::Resolved);
    let ids: Vec<_> = result.candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["6", "18"]);
    assert_eq!(result.candidates[0].reasoning.as_deref(), Some("compact SUV"));

    assert_eq!(result.profile_source, ProfileSource::Generative);
    assert_eq!(result.profile.age_range, AgeRange::From35To49);
    assert_eq!(result.profile.geekiness.get(), 6);
    assert_eq!(result.profile.sophistication, Sophistication::Intermediate);
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);

    let request = completer.last.lock().unwrap().clone().unwrap();
    assert!(request.system.contains("6:SUV"));
    assert!(!request.system.contains("Air Travel"));
    assert!(request.system.contains("user_profile"));
}

#[tokio::test]
async fn scenario_b_non_json_reply_degrades_to_neutral() {
    let completer = MockCompleter::new(Ok("Sorry, I can't help with that."));
    let classifier = classifier_with(completer, ClassifierConfig::default()).await;

    let result = classifier.classify(RAV4).await.unwrap();
    assert_eq!(result.domain, "Automotive");
    assert!(result.candidates.is_empty());
    assert_eq!(result.tier2_status, Tier2Status::ParseFailed);
    assert_eq!(result.method, MethodTag::EmbeddingOnly);
    assert_eq!(result.profile, UserProfileEstimate::neutral());
    assert_eq!(result.profile_source, ProfileSource::Neutral);
}

#[tokio::test]
async fn provider_failure_with_heuristic_fallback() {
    let completer = MockCompleter::new(Err(GenerativeError::RateLimited("openai".into())));
    let config =
        ClassifierConfig::default().with_profile_mode(ProfileMode::GenerativeWithHeuristicFallback);
    let classifier = classifier_with(completer, config).await;

    let result = classifier.classify(RAV4).await.unwrap();
    assert_eq!(result.tier2_status, Tier2Status::ProviderFailed);
    assert!(result.candidates.is_empty());
    assert_eq!(result.profile_source, ProfileSource::Heuristic);
    assert_eq!(result.profile.age_range, AgeRange::From35To49);
    assert!(result.profile.tags.contains(&"family_oriented".to_string()));
}

#[tokio::test]
async fn heuristic_mode_does_not_request_profile() {
    let completer = MockCompleter::new(Ok(r#"[{"id": "6", "name": "SUV", "confidence": 0.9}]"#));
    let config = ClassifierConfig::default().with_profile_mode(ProfileMode::Heuristic);
    let classifier = classifier_with(completer.clone(), config).await;

    let result = classifier.classify(RAV4).await.unwrap();
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.profile_source, ProfileSource::Heuristic);
    let request = completer.last.lock().unwrap().clone().unwrap();
    assert!(!request.system.contains("user_profile"));
}

#[tokio::test]
async fn blank_input_is_rejected_before_any_call() {
    let completer = MockCompleter::new(Ok("[]"));
    let classifier = classifier_with(completer.clone(), ClassifierConfig::default()).await;
    assert_eq!(classifier.classify(" \n\t").await, Err(ClassifyError::EmptyInput));
    assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embedding_failure_propagates_without_fallback() {
    let catalog = fixture_catalog();
    let index = fixture_index(&catalog, &stub()).await;
    let completer = MockCompleter::new(Ok("[]"));
    let classifier = Classifier::new(
        catalog,
        index,
        Arc::new(DownEmbedder),
        completer.clone(),
        ClassifierConfig::default(),
    )
    .unwrap();

    assert!(matches!(
        classifier.classify(RAV4).await,
        Err(ClassifyError::ExternalService(_))
    ));
    assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn keyword_fallback_is_opt_in_and_tagged() {
    let catalog = fixture_catalog();
    let index = fixture_index(&catalog, &stub()).await;
    let completer = MockCompleter::new(Ok(r#"[{"name": "SUV", "confidence": 0.7}]"#));
    let classifier = Classifier::new(
        catalog,
        index,
        Arc::new(DownEmbedder),
        completer,
        ClassifierConfig::default().with_keyword_fallback(true),
    )
    .unwrap();

    let result = classifier.classify(RAV4).await.unwrap();
    assert_eq!(result.domain, "Automotive");
    assert_eq!(result.method, MethodTag::KeywordFallback);
    assert_eq!(result.candidates.len(), 1);

    assert!(matches!(
        classifier.classify("a quiet afternoon").await,
        Err(ClassifyError::ExternalService(_))
    ));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let catalog = fixture_catalog();
    let embedder = stub();
    let index = fixture_index(&catalog, &embedder).await;
    let result = Classifier::new(
        catalog,
        index,
        embedder,
        MockCompleter::new(Ok("[]")),
        ClassifierConfig::default().with_max_results(0),
    );
    assert!(matches!(result, Err(ClassifyError::InvalidConfig(_))));
}

#[tokio::test]
async fn classification_is_repeatable() {
    let completer = MockCompleter::new(Ok(r#"[{"id": "6", "name": "SUV", "confidence": 0.9}]"#));
    let classifier = classifier_with(completer, ClassifierConfig::default()).await;
    let a = classifier.classify(RAV4).await.unwrap();
    let b = classifier.classify(RAV4).await.unwrap();
    assert_eq!(a.domain, b.domain);
    assert_eq!(a.domain_confidence, b.domain_confidence);
    assert_eq!(a.candidates, b.candidates);
    assert_eq!(a.profile, b.profile);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lazy_classifier_initializes_once() {
    let inits = Arc::new(AtomicUsize::new(0));
    let counter = inits.clone();
    let lazy = Arc::new(LazyClassifier::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let completer = MockCompleter::new(Ok(r#"[{"name": "SUV"}]"#));
            Ok(classifier_with(completer, ClassifierConfig::default()).await)
        }
    }));
    assert!(!lazy.is_initialized());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let lazy = lazy.clone();
        handles.push(tokio::spawn(async move { lazy.classify(RAV4).await }));
    }
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.domain, "Automotive");
    }
    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert!(lazy.is_initialized());
}

#[tokio::test]
async fn lazy_classifier_retries_after_failed_init() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let lazy = LazyClassifier::new(move || {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                return Err(ClassifyError::Init("taxonomy not ready".into()));
            }
            Ok(classifier_with(MockCompleter::new(Ok("[]")), ClassifierConfig::default()).await)
        }
    });

    assert!(matches!(lazy.get().await, Err(ClassifyError::Init(_))));
    assert!(!lazy.is_initialized());
    assert!(lazy.get().await.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
