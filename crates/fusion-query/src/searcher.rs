//! Hybrid search orchestration over the two upstream searches.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout_at;
use tracing::{debug, info, warn};
use ulid::Ulid;

use fusion_core::{
    FusedResultList, FusionConfig, FusionError, HybridQuery, KeywordSearcher, ResultSet, Result,
    SourceKind, VectorSearcher,
};

use crate::engine::{validate_alpha, validate_limit, FusionEngine};
use crate::over_search::OverSearchPolicy;

/// What the upstream searches produced.
enum Retrieved {
    Both(ResultSet, ResultSet),
    VectorOnly(ResultSet),
    KeywordOnly(ResultSet),
}

/// Hybrid search over a vector and a keyword searcher.
///
/// Both searches run concurrently under a single deadline, then the
/// results are fused with the query's algorithm and weight.
pub struct HybridSearcher<V, K> {
    /// Dense vector search.
    vector: Arc<V>,

    /// Keyword search.
    keyword: Arc<K>,

    engine: FusionEngine,
    over_search: OverSearchPolicy,
    config: FusionConfig,
}

impl<V, K> HybridSearcher<V, K>
where
    V: VectorSearcher,
    K: KeywordSearcher,
{
    /// Create a new hybrid searcher.
    pub fn new(vector: Arc<V>, keyword: Arc<K>, config: FusionConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            vector,
            keyword,
            engine: FusionEngine::new(&config.search),
            over_search: OverSearchPolicy::from(&config.over_search),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// The underlying fusion engine.
    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    /// Run both searches and fuse their results.
    pub async fn search(&self, query: &HybridQuery) -> Result<FusedResultList> {
        let start = Instant::now();
        let query_id = Ulid::new();

        let search = &self.config.search;
        let alpha = query.alpha.unwrap_or(search.alpha);
        let limit = query.limit.unwrap_or(search.default_limit);
        let algorithm = query.algorithm.unwrap_or(search.algorithm);

        validate_alpha(alpha)?;
        validate_limit(limit)?;
        if limit > search.max_limit {
            return Err(FusionError::invalid_limit(
                limit,
                format!("exceeds maximum of {}", search.max_limit),
            ));
        }

        let strategy = self.engine.strategy(algorithm);
        let fetch_k = self.over_search.retrieval_size(limit, strategy);

        info!(
            "Hybrid search {} for {:?} ({}, alpha {}, limit {}, fetching {})",
            query_id, query.text, algorithm, alpha, limit, fetch_k
        );

        let fused = match self.retrieve(query, fetch_k).await? {
            Retrieved::Both(vector, keyword) => {
                debug!(
                    "Search {}: vector returned {} results, keyword returned {} results",
                    query_id,
                    vector.len(),
                    keyword.len()
                );
                self.engine
                    .fuse_with(strategy, &vector, &keyword, alpha, limit)?
            }
            Retrieved::VectorOnly(vector) => {
                self.engine
                    .fuse_with(strategy, &vector, &ResultSet::empty(), 1.0, limit)?
            }
            Retrieved::KeywordOnly(keyword) => {
                self.engine
                    .fuse_with(strategy, &ResultSet::empty(), &keyword, 0.0, limit)?
            }
        };

        info!(
            "Hybrid search {} completed in {}ms, returned {} results",
            query_id,
            start.elapsed().as_millis(),
            fused.len()
        );

        Ok(fused)
    }

    /// Run both searches under one deadline.
    ///
    /// Without fallback the first failure cancels the other search.
    async fn retrieve(&self, query: &HybridQuery, k: usize) -> Result<Retrieved> {
        let timeout_ms = self.config.upstream.timeout_ms;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);

        let vector = async {
            match timeout_at(deadline, self.vector.vector_search(query, k)).await {
                Ok(results) => results.map_err(|e| upstream_error(SourceKind::Vector, e)),
                Err(_) => Err(timed_out(SourceKind::Vector, timeout_ms)),
            }
        };
        let keyword = async {
            match timeout_at(deadline, self.keyword.keyword_search(query, k)).await {
                Ok(results) => results.map_err(|e| upstream_error(SourceKind::Keyword, e)),
                Err(_) => Err(timed_out(SourceKind::Keyword, timeout_ms)),
            }
        };

        if !self.config.upstream.single_source_fallback {
            let (vector, keyword) = tokio::try_join!(vector, keyword)?;
            return Ok(Retrieved::Both(vector, keyword));
        }

        match tokio::join!(vector, keyword) {
            (Ok(vector), Ok(keyword)) => Ok(Retrieved::Both(vector, keyword)),
            (Ok(vector), Err(e)) => {
                warn!("{}; falling back to vector results only", e);
                Ok(Retrieved::VectorOnly(vector))
            }
            (Err(e), Ok(keyword)) => {
                warn!("{}; falling back to keyword results only", e);
                Ok(Retrieved::KeywordOnly(keyword))
            }
            (Err(e), Err(other)) => {
                warn!("{}", other);
                Err(e)
            }
        }
    }
}

fn upstream_error(kind: SourceKind, err: FusionError) -> FusionError {
    if err.is_upstream() {
        err
    } else {
        FusionError::upstream(kind, err.to_string())
    }
}

fn timed_out(kind: SourceKind, timeout_ms: u64) -> FusionError {
    FusionError::upstream(kind, format!("timed out after {}ms", timeout_ms))
}
