use std::sync::Arc;
use std::time::Instant;

use generative::Completer;
use index::EmbeddingIndex;
use semantic::resilience::CallGate;
use semantic::Embedder;
use taxonomy::TaxonomyCatalog;
use tracing::{info, info_span, warn, Instrument};

use crate::assemble::combine;
use crate::config::ClassifierConfig;
use crate::profile::ProfileEstimator;
use crate::rules::RuleTable;
use crate::tier1::Tier1Detector;
use crate::tier2::Tier2Classifier;
use crate::types::{ClassificationResult, DomainMatch};
use crate::ClassifyError;

#[cfg(test)]
mod tests;

/// The classification service.
///
/// Built once at startup from a loaded catalog and index plus the two
/// providers, then shared by reference. Holds no per-request state.
pub struct Classifier {
    catalog: Arc<TaxonomyCatalog>,
    tier1: Tier1Detector,
    tier2: Tier2Classifier,
    profile: ProfileEstimator,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(
        catalog: Arc<TaxonomyCatalog>,
        index: Arc<EmbeddingIndex>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        config: ClassifierConfig,
    ) -> Result<Self, ClassifyError> {
        config.validate()?;

        for domain in index.domains() {
            if catalog.subset(domain).is_empty() {
                warn!(domain = %domain, "index_domain_missing_from_catalog");
            }
        }

        // One gate for both providers: the bound is on external calls overall.
        let gate = CallGate::new(config.gate);
        let tier1 = Tier1Detector::new(index, embedder, gate.clone(), config.tier1_prefix_chars);
        let tier2 = Tier2Classifier::new(completer, gate)
            .with_text_chars(config.tier2_text_chars)
            .with_sampling(config.temperature, config.max_tokens)
            .with_default_confidence(config.default_confidence)
            .with_profile_request(config.profile_mode.wants_generative());

        Ok(Self {
            catalog,
            tier1,
            tier2,
            profile: ProfileEstimator::new(config.profile_mode),
            config,
        })
    }

    pub fn catalog(&self) -> &TaxonomyCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn tier1(&self) -> &Tier1Detector {
        &self.tier1
    }

    /// Classify `text`.
    ///
    /// Fails only when the text is blank or no domain can be determined.
    /// Once a domain is known the call always returns a result, with empty
    /// candidates or a neutral profile when later stages fail.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let span = info_span!("classify", chars = text.chars().count());
        self.classify_inner(text).instrument(span).await
    }

    async fn classify_inner(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        let start = Instant::now();
        let domain = self.detect_domain(text).await?;

        let subset = self.catalog.subset(&domain.domain);
        let tier2 = self
            .tier2
            .classify(text, &domain.domain, &subset, self.config.max_results)
            .await;
        let profile = self
            .profile
            .estimate(text, &domain.domain, tier2.profile_hints.as_ref());

        let result = combine(
            &domain,
            &tier2,
            &profile,
            start.elapsed(),
            self.config.max_results,
        );
        info!(
            domain = %result.domain,
            domain_confidence = result.domain_confidence,
            candidates = result.candidates.len(),
            method = %result.method,
            tier2_status = ?result.tier2_status,
            profile_source = ?result.profile_source,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "classify_success"
        );
        Ok(result)
    }

    async fn detect_domain(&self, text: &str) -> Result<DomainMatch, ClassifyError> {
        match self.tier1.detect(text).await {
            Ok(domain) => Ok(domain),
            Err(err @ ClassifyError::ExternalService(_)) if self.config.tier1_keyword_fallback => {
                match RuleTable::builtin().keyword_domain(text, self.catalog.domains()) {
                    Some(domain) => {
                        warn!(error = %err, domain = %domain.domain, "tier1_keyword_fallback");
                        Ok(domain)
                    }
                    None => {
                        warn!(error = %err, "classify_failed");
                        Err(err)
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "classify_failed");
                Err(err)
            }
        }
    }
}
