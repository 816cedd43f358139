use std::time::Instant;

use semantic::{dot, l2_norm, l2_normalize_in_place, Embedder};
use serde::Serialize;
use tracing::{debug, info};

use crate::IndexError;

/// Similarity differences at or below this are ties.
pub const TIE_EPSILON: f32 = 1e-6;

/// How far a stored vector's norm may stray from 1 before a load rejects it.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-4;

/// A domain and its cosine similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub domain: String,
    pub score: f32,
}

/// One unit-length vector per top-level domain, searched exhaustively.
///
/// `domains[i]` is described by `vectors[i]`; the order is the order the
/// domains were supplied in and is also the tie-break order for
/// [`nearest`](Self::nearest).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingIndex {
    domains: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl EmbeddingIndex {
    /// Embed each `(domain, description)` pair once and normalize the result.
    pub async fn build<E>(descriptions: &[(String, String)], embedder: &E) -> Result<Self, IndexError>
    where
        E: Embedder + ?Sized,
    {
        if descriptions.is_empty() {
            return Err(IndexError::Data("no domain descriptions to index".into()));
        }

        let start = Instant::now();
        let mut domains = Vec::with_capacity(descriptions.len());
        let mut vectors = Vec::with_capacity(descriptions.len());
        for (domain, description) in descriptions {
            let vector = embedder.embed(description).await?;
            debug!(domain = %domain, dim = vector.len(), "domain_embedded");
            domains.push(domain.clone());
            vectors.push(vector);
        }

        let index = Self::from_parts(domains, vectors)?;
        info!(
            domains = index.len(),
            dimension = index.dimension,
            model = embedder.model_name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index_built"
        );
        Ok(index)
    }

    /// Validated constructor. Vectors are normalized; zero vectors, empty
    /// input, duplicate domains and mixed dimensions are rejected.
    pub fn from_parts(domains: Vec<String>, mut vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dimension = validate(&domains, &vectors)?;
        for vector in &mut vectors {
            l2_normalize_in_place(vector);
        }
        Ok(Self {
            domains,
            vectors,
            dimension,
        })
    }

    /// Constructor for vectors read back from disk. They must already be unit
    /// length within [`UNIT_NORM_TOLERANCE`] and are kept bit for bit.
    pub(crate) fn from_stored(domains: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dimension = validate(&domains, &vectors)?;
        for (domain, vector) in domains.iter().zip(&vectors) {
            let norm = l2_norm(vector);
            if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
                return Err(IndexError::Data(format!(
                    "stored vector for `{domain}` has norm {norm}, expected unit length"
                )));
            }
        }
        Ok(Self {
            domains,
            vectors,
            dimension,
        })
    }

    /// Top `top_n` domains by cosine similarity, best first.
    ///
    /// Scores within [`TIE_EPSILON`] of the current best count as ties and
    /// keep stored order. The query need not be normalized.
    pub fn nearest(&self, query: &[f32], top_n: usize) -> Result<Vec<DomainScore>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::Data(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }
        let mut unit = query.to_vec();
        l2_normalize_in_place(&mut unit);

        let scores: Vec<f32> = self
            .vectors
            .iter()
            .map(|v| dot(&unit, v))
            .map(|s| if s.is_nan() { f32::NEG_INFINITY } else { s })
            .collect();

        // Selection scan: a later domain only wins by more than the epsilon.
        let mut taken = vec![false; scores.len()];
        let mut hits = Vec::with_capacity(top_n.min(scores.len()));
        while hits.len() < top_n {
            let mut best: Option<usize> = None;
            for (i, &score) in scores.iter().enumerate() {
                if taken[i] {
                    continue;
                }
                match best {
                    Some(b) if score <= scores[b] + TIE_EPSILON => {}
                    _ => best = Some(i),
                }
            }
            let Some(i) = best else { break };
            taken[i] = true;
            hits.push(DomainScore {
                domain: self.domains[i].clone(),
                score: scores[i],
            });
        }
        Ok(hits)
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Shape checks shared by both constructors; returns the common dimension.
fn validate(domains: &[String], vectors: &[Vec<f32>]) -> Result<usize, IndexError> {
    if domains.len() != vectors.len() {
        return Err(IndexError::Data(format!(
            "{} domains but {} vectors",
            domains.len(),
            vectors.len()
        )));
    }
    let Some(first) = vectors.first() else {
        return Err(IndexError::Data("index has no domains".into()));
    };
    let dimension = first.len();
    if dimension == 0 {
        return Err(IndexError::Data("vectors have zero dimension".into()));
    }

    for (i, (domain, vector)) in domains.iter().zip(vectors).enumerate() {
        if domain.trim().is_empty() {
            return Err(IndexError::Data(format!("domain name at position {i} is empty")));
        }
        if domains[..i].contains(domain) {
            return Err(IndexError::Data(format!("duplicate domain `{domain}`")));
        }
        if vector.len() != dimension {
            return Err(IndexError::Data(format!(
                "vector for `{domain}` has dimension {}, expected {dimension}",
                vector.len()
            )));
        }
        let norm = l2_norm(vector);
        if !norm.is_finite() || norm == 0.0 {
            return Err(IndexError::Data(format!(
                "vector for `{domain}` has zero or non-finite norm"
            )));
        }
    }
    Ok(dimension)
}
