//! Candidate oversampling ahead of score-based fusion.
//!
//! Min-max normalization depends on which hits made it into each sample.
//! Two small samples with little overlap can split cleanly into 0 and 1
//! even when the underlying scores are close, so strategies that ask for
//! it get `limit * factor` candidates per source (never fewer than
//! `min_candidates`). The fused list is cut back to `limit` afterwards.

use fusion_core::OverSearchConfig;

use crate::fusion::FusionStrategy;

/// How many candidates to request from each upstream search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverSearchPolicy {
    enabled: bool,
    factor: usize,
    min_candidates: usize,
}

impl OverSearchPolicy {
    /// Create a policy; a `factor` of 0 is treated as 1.
    pub fn new(factor: usize, min_candidates: usize) -> Self {
        Self {
            enabled: true,
            factor: factor.max(1),
            min_candidates,
        }
    }

    /// A policy that always requests exactly `limit`.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            factor: 1,
            min_candidates: 0,
        }
    }

    /// Per-source retrieval size for a query capped at `limit`.
    pub fn retrieval_size(&self, limit: usize, strategy: &dyn FusionStrategy) -> usize {
        if !self.enabled || !strategy.wants_over_search() {
            return limit;
        }

        limit
            .saturating_mul(self.factor)
            .max(self.min_candidates)
            .max(limit)
    }
}

impl Default for OverSearchPolicy {
    fn default() -> Self {
        Self::from(&OverSearchConfig::default())
    }
}

impl From<&OverSearchConfig> for OverSearchPolicy {
    fn from(config: &OverSearchConfig) -> Self {
        if config.enabled {
            Self::new(config.factor, config.min_candidates)
        } else {
            Self::disabled()
        }
    }
}
