//! Interfaces to the upstream search collaborators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{FusionAlgorithm, ResultSet};

/// A hybrid query as seen by the upstream searches.
///
/// Unset fusion parameters fall back to the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HybridQuery {
    /// Query text for keyword search.
    pub text: String,

    /// Pre-computed query embedding, if the caller has one.
    #[serde(default)]
    pub vector: Option<Vec<f32>>,

    /// Weight for the vector component (0 = keyword only, 1 = vector only).
    #[serde(default)]
    pub alpha: Option<f32>,

    /// Maximum number of fused results.
    #[serde(default)]
    pub limit: Option<usize>,

    /// Fusion algorithm for this query.
    #[serde(default)]
    pub algorithm: Option<FusionAlgorithm>,
}

impl HybridQuery {
    /// Create a query with default fusion parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_algorithm(mut self, algorithm: FusionAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }
}

/// Dense vector similarity search.
#[async_trait]
pub trait VectorSearcher: Send + Sync {
    /// Return up to `k` hits ordered by decreasing similarity.
    async fn vector_search(&self, query: &HybridQuery, k: usize) -> Result<ResultSet>;
}

/// Sparse keyword (BM25) search.
#[async_trait]
pub trait KeywordSearcher: Send + Sync {
    /// Return up to `k` hits ordered by decreasing relevance.
    async fn keyword_search(&self, query: &HybridQuery, k: usize) -> Result<ResultSet>;
}
