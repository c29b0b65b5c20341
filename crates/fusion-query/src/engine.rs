//! Fusion engine: validation, strategy dispatch and truncation.

use std::borrow::Cow;

use tracing::{debug, warn, Level};

use fusion_core::{
    FusedResultList, FusionAlgorithm, FusionError, ResultSet, Result, SearchConfig, SourceKind,
};

use crate::fusion::{FusionStrategy, RankedFusion, RelativeScoreFusion};

/// Combines a vector and a keyword result set into one ranking.
///
/// The engine holds no per-query state; one instance can serve any
/// number of concurrent queries with different algorithms and weights.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    ranked: RankedFusion,
    relative: RelativeScoreFusion,
    strict: bool,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl FusionEngine {
    /// Create an engine from search configuration.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            ranked: RankedFusion::new(config.rank_k),
            relative: RelativeScoreFusion,
            strict: config.strict_result_sets,
        }
    }

    /// Built-in strategy for an algorithm.
    pub fn strategy(&self, algorithm: FusionAlgorithm) -> &dyn FusionStrategy {
        match algorithm {
            FusionAlgorithm::RankedFusion => &self.ranked,
            FusionAlgorithm::RelativeScoreFusion => &self.relative,
        }
    }

    /// Fuse with one of the built-in algorithms.
    pub fn fuse(
        &self,
        vector: &ResultSet,
        keyword: &ResultSet,
        alpha: f32,
        limit: usize,
        algorithm: FusionAlgorithm,
    ) -> Result<FusedResultList> {
        self.fuse_with(self.strategy(algorithm), vector, keyword, alpha, limit)
    }

    /// Fuse with any strategy.
    ///
    /// Fails without producing output when `alpha` is outside `[0, 1]`,
    /// `limit` is zero, or a raw score is not finite. Duplicate ids are
    /// dropped after their first occurrence unless strict mode is on.
    pub fn fuse_with(
        &self,
        strategy: &dyn FusionStrategy,
        vector: &ResultSet,
        keyword: &ResultSet,
        alpha: f32,
        limit: usize,
    ) -> Result<FusedResultList> {
        validate_alpha(alpha)?;
        validate_limit(limit)?;
        vector.check_finite(SourceKind::Vector)?;
        keyword.check_finite(SourceKind::Keyword)?;

        let vector = self.unique(vector, SourceKind::Vector)?;
        let keyword = self.unique(keyword, SourceKind::Keyword)?;

        if vector.is_empty() && keyword.is_empty() {
            debug!("Both result sets are empty");
            return Ok(FusedResultList::empty(strategy.name(), alpha));
        }

        let mut hits = strategy.fuse(&vector, &keyword, alpha);
        let candidates = hits.len();
        hits.truncate(limit);

        let fused = FusedResultList {
            strategy: strategy.name().to_string(),
            alpha,
            hits,
        };

        debug!(
            "Fused {} vector and {} keyword results with {} (alpha {}) into {} of {} candidates",
            vector.len(),
            keyword.len(),
            strategy.name(),
            alpha,
            fused.len(),
            candidates
        );
        if tracing::enabled!(Level::DEBUG) {
            debug!("Fused result fingerprint {}", fused.fingerprint());
        }

        Ok(fused)
    }

    /// Drop repeated ids, or reject them in strict mode.
    fn unique<'a>(&self, results: &'a ResultSet, kind: SourceKind) -> Result<Cow<'a, ResultSet>> {
        if !results.is_descending() {
            debug!("{} results are not sorted by score; using given order as rank", kind);
        }

        let dedup = results.deduplicated();
        let Some(first) = dedup.duplicates.first() else {
            return Ok(dedup.results);
        };

        let err = FusionError::MalformedResultSet {
            kind,
            object_id: first.to_string(),
            duplicates: dedup.duplicates.len(),
        };
        if self.strict {
            return Err(err);
        }

        warn!("{}; keeping highest-ranked occurrences", err);
        Ok(dedup.results)
    }
}

/// Reject weights outside `[0, 1]`, including NaN.
pub fn validate_alpha(alpha: f32) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(FusionError::invalid_weight(alpha))
    }
}

/// Reject a zero result limit.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(FusionError::invalid_limit(limit, "limit must be positive"));
    }
    Ok(())
}
