//! Core domain types for hybrid result fusion.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::str::FromStr;
use ulid::Ulid;

use crate::error::{FusionError, Result};

/// Opaque identifier of a searchable object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create an object id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<Ulid> for ObjectId {
    fn from(id: Ulid) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Which upstream search produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Dense vector similarity search.
    Vector,
    /// Sparse keyword (BM25) search.
    Keyword,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => f.write_str("vector"),
            Self::Keyword => f.write_str("keyword"),
        }
    }
}

/// Fusion algorithm selected per query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FusionAlgorithm {
    /// Position-based scoring, blind to raw score magnitude.
    #[default]
    RankedFusion,
    /// Min-max normalized raw scores.
    RelativeScoreFusion,
}

impl FusionAlgorithm {
    /// Canonical name used in configuration and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankedFusion => "rankedFusion",
            Self::RelativeScoreFusion => "relativeScoreFusion",
        }
    }
}

impl std::fmt::Display for FusionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FusionAlgorithm {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "ranked" | "rankedfusion" => Ok(Self::RankedFusion),
            "relative" | "relativescore" | "relativescorefusion" => {
                Ok(Self::RelativeScoreFusion)
            }
            _ => Err(FusionError::invalid_argument(format!(
                "unknown fusion algorithm: {s}"
            ))),
        }
    }
}

/// A single hit returned by one search source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Object identifier.
    pub object_id: ObjectId,

    /// Raw score as reported by the source (higher is better).
    pub raw_score: f32,

    /// Position in the source result set (0-based).
    pub source_rank: usize,
}

/// Wire form of a hit; ranks are implied by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub id: ObjectId,
    pub score: f32,
}

/// Ordered hits from one search source, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ScoredEntry>", into = "Vec<ScoredEntry>")]
pub struct ResultSet {
    hits: Vec<SearchHit>,
}

/// Outcome of removing repeated object ids from a result set.
#[derive(Debug, Clone)]
pub struct Deduplicated<'a> {
    /// Result set with only the first occurrence of each id.
    pub results: Cow<'a, ResultSet>,

    /// Ids that occurred more than once, in order of first repeat.
    pub duplicates: Vec<ObjectId>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result set from `(id, score)` pairs in rank order.
    pub fn from_scores<I, T>(scores: I) -> Self
    where
        I: IntoIterator<Item = (T, f32)>,
        T: Into<ObjectId>,
    {
        let hits = scores
            .into_iter()
            .enumerate()
            .map(|(rank, (id, score))| SearchHit {
                object_id: id.into(),
                raw_score: score,
                source_rank: rank,
            })
            .collect();
        Self { hits }
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether the result set has no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hits in rank order.
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    /// Iterate over hits in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit> {
        self.hits.iter()
    }

    /// Whether raw scores are non-increasing along the ranking.
    pub fn is_descending(&self) -> bool {
        self.hits
            .windows(2)
            .all(|pair| pair[0].raw_score >= pair[1].raw_score)
    }

    /// Reject NaN and infinite raw scores.
    pub fn check_finite(&self, kind: SourceKind) -> Result<()> {
        match self.hits.iter().find(|hit| !hit.raw_score.is_finite()) {
            Some(hit) => Err(FusionError::NonFiniteScore {
                kind,
                object_id: hit.object_id.to_string(),
                score: hit.raw_score,
            }),
            None => Ok(()),
        }
    }

    /// Keep the first (highest-ranked) occurrence of every object id.
    ///
    /// Ranks are reassigned by position in the returned set. Borrows
    /// `self` unchanged when there is nothing to remove.
    pub fn deduplicated(&self) -> Deduplicated<'_> {
        let mut seen: HashSet<&ObjectId> = HashSet::with_capacity(self.hits.len());
        let mut duplicates = Vec::new();

        for hit in &self.hits {
            if !seen.insert(&hit.object_id) {
                duplicates.push(hit.object_id.clone());
            }
        }

        if duplicates.is_empty() {
            return Deduplicated {
                results: Cow::Borrowed(self),
                duplicates,
            };
        }

        seen.clear();
        let unique = self
            .hits
            .iter()
            .filter(|hit| seen.insert(&hit.object_id))
            .map(|hit| (hit.object_id.clone(), hit.raw_score));

        Deduplicated {
            results: Cow::Owned(Self::from_scores(unique)),
            duplicates,
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchHit;
    type IntoIter = std::slice::Iter<'a, SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

impl<T: Into<ObjectId>> FromIterator<(T, f32)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (T, f32)>>(iter: I) -> Self {
        Self::from_scores(iter)
    }
}

impl From<Vec<ScoredEntry>> for ResultSet {
    fn from(entries: Vec<ScoredEntry>) -> Self {
        Self::from_scores(entries.into_iter().map(|e| (e.id, e.score)))
    }
}

impl From<ResultSet> for Vec<ScoredEntry> {
    fn from(results: ResultSet) -> Self {
        results
            .hits
            .into_iter()
            .map(|hit| ScoredEntry {
                id: hit.object_id,
                score: hit.raw_score,
            })
            .collect()
    }
}

/// One object in the fused ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridHit {
    /// Object identifier.
    pub object_id: ObjectId,

    /// Normalized vector score (0 when absent from vector results).
    pub vector_component: f32,

    /// Normalized keyword score (0 when absent from keyword results).
    pub keyword_component: f32,

    /// `alpha * vector_component + (1 - alpha) * keyword_component`.
    pub fused_score: f32,

    /// Rank in the vector results (0-based).
    pub vector_rank: Option<usize>,

    /// Rank in the keyword results (0-based).
    pub keyword_rank: Option<usize>,
}

impl HybridHit {
    /// One-line breakdown of how the fused score was built.
    pub fn explain(&self, alpha: f32) -> String {
        format!(
            "(hybrid) {:.6} = vector[{}] {:.6} * {:.2} + keyword[{}] {:.6} * {:.2}",
            self.fused_score,
            describe_rank(self.vector_rank),
            self.vector_component,
            alpha,
            describe_rank(self.keyword_rank),
            self.keyword_component,
            1.0 - alpha,
        )
    }
}

fn describe_rank(rank: Option<usize>) -> String {
    match rank {
        Some(rank) => format!("#{}", rank + 1),
        None => "absent".to_string(),
    }
}

/// Fused, deduplicated ranking, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResultList {
    /// Name of the strategy that produced the scores.
    pub strategy: String,

    /// Weight applied to the vector component.
    pub alpha: f32,

    /// Fused hits sorted by fused score descending.
    pub hits: Vec<HybridHit>,
}

impl FusedResultList {
    /// An empty ranking.
    pub fn empty(strategy: impl Into<String>, alpha: f32) -> Self {
        Self {
            strategy: strategy.into(),
            alpha,
            hits: Vec::new(),
        }
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate over hits best first.
    pub fn iter(&self) -> std::slice::Iter<'_, HybridHit> {
        self.hits.iter()
    }

    /// Object ids in ranked order.
    pub fn ids(&self) -> Vec<&ObjectId> {
        self.hits.iter().map(|hit| &hit.object_id).collect()
    }

    /// `(id, fused_score)` pairs in ranked order.
    pub fn scores(&self) -> Vec<(ObjectId, f32)> {
        self.hits
            .iter()
            .map(|hit| (hit.object_id.clone(), hit.fused_score))
            .collect()
    }

    /// Blake3 digest over ids and exact score bits, hex encoded.
    ///
    /// Two lists have the same fingerprint only if they are bit-for-bit
    /// identical.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.strategy.as_bytes());
        hasher.update(&[0]);
        hasher.update(&self.alpha.to_bits().to_le_bytes());

        for hit in &self.hits {
            hasher.update(hit.object_id.as_str().as_bytes());
            hasher.update(&[0]);
            hasher.update(&hit.fused_score.to_bits().to_le_bytes());
            hasher.update(&hit.vector_component.to_bits().to_le_bytes());
            hasher.update(&hit.keyword_component.to_bits().to_le_bytes());
        }

        hex::encode(hasher.finalize().as_bytes())
    }
}

impl<'a> IntoIterator for &'a FusedResultList {
    type Item = &'a HybridHit;
    type IntoIter = std::slice::Iter<'a, HybridHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}
