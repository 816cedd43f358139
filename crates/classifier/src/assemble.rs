use std::time::Duration;

use crate::types::{
    ClassificationCandidate, ClassificationResult, DomainMatch, DomainSource, MethodTag,
    Tier2Outcome, UserProfileEstimate,
};

/// Keep the best-scoring candidate per id, order by confidence descending
/// and cap at `k`.
///
/// Equal confidences keep their first-seen order, so ranking an already
/// ranked list returns it unchanged.
pub fn rank_candidates(
    candidates: &[ClassificationCandidate],
    k: usize,
) -> Vec<ClassificationCandidate> {
    let mut ranked: Vec<ClassificationCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match ranked.iter_mut().find(|c| c.id == candidate.id) {
            Some(existing) if candidate.confidence > existing.confidence => {
                *existing = candidate.clone();
            }
            Some(_) => {}
            None => ranked.push(candidate.clone()),
        }
    }
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked.truncate(k);
    ranked
}

/// Merge the stage outputs into the final result. Pure; borrows its inputs.
pub fn combine(
    domain: &DomainMatch,
    tier2: &Tier2Outcome,
    profile: &UserProfileEstimate,
    elapsed: Duration,
    k: usize,
) -> ClassificationResult {
    let candidates = rank_candidates(&tier2.candidates, k);
    let method = match domain.source {
        DomainSource::Keywords => MethodTag::KeywordFallback,
        DomainSource::Embedding if candidates.is_empty() => MethodTag::EmbeddingOnly,
        DomainSource::Embedding => MethodTag::Hybrid,
    };

    ClassificationResult {
        domain: domain.domain.clone(),
        domain_confidence: domain.confidence,
        candidates,
        profile: profile.clone(),
        elapsed,
        method,
        tier2_status: tier2.status,
        profile_source: profile.source,
    }
}
