//! Same inputs, same outputs: domain ties, repeated requests, rebuilt indexes.

mod common;

use common::{RAV4, SUV_REPLY, ScriptedCompleter, Workspace};
use iabc::{EmbeddingIndex, ProfileMode};

#[test]
fn scenario_c_near_tie_prefers_stored_order() {
    // cos(query, "Later") - cos(query, "Earlier") is about 5e-7.
    let index = EmbeddingIndex::from_parts(
        vec!["Earlier".to_string(), "Later".to_string()],
        vec![vec![1.0, 1e-3, 0.0], vec![1.0, 0.0, 0.0]],
    )
    .unwrap();

    for _ in 0..10 {
        let hits = index.nearest(&[3.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].domain, "Earlier");
    }
}

#[tokio::test]
async fn rebuilding_the_index_is_byte_identical() {
    let ws = Workspace::new();
    ws.build_index().await;
    let first = std::fs::read(ws.index_dir().join(index::VECTORS_FILE)).unwrap();
    ws.build_index().await;
    let second = std::fs::read(ws.index_dir().join(index::VECTORS_FILE)).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn repeated_requests_agree() {
    let ws = Workspace::new();
    let classifier = ws.classifier(ScriptedCompleter::ok(SUV_REPLY)).await;

    let first = classifier.classify(RAV4).await.unwrap();
    for _ in 0..5 {
        let next = classifier.classify(RAV4).await.unwrap();
        assert_eq!(next.domain, first.domain);
        assert_eq!(next.domain_confidence, first.domain_confidence);
        assert_eq!(next.candidates, first.candidates);
        assert_eq!(next.profile, first.profile);
        assert_eq!(next.method, first.method);
    }
}

#[tokio::test]
async fn heuristic_profile_is_stable_across_classifiers() {
    let mut ws = Workspace::new();
    ws.config.classifier.profile_mode = ProfileMode::Heuristic;
    let a = ws.classifier(ScriptedCompleter::ok(SUV_REPLY)).await;
    let b = ws.classifier(ScriptedCompleter::ok(SUV_REPLY)).await;

    let pa = a.classify(RAV4).await.unwrap().profile;
    let pb = b.classify(RAV4).await.unwrap().profile;
    assert_eq!(pa, pb);
    assert!(pa.tags.iter().any(|t| t == "family_oriented"));
}
