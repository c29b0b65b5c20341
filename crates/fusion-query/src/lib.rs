//! fusion-query - Hybrid result fusion
//!
//! This crate merges a dense vector result set and a sparse keyword
//! result set into a single ranking.
//!
//! # Features
//!
//! - Ranked fusion (`1 / (k + rank)`, blind to raw score magnitude)
//! - Relative score fusion (min-max normalized raw scores)
//! - Candidate over-search for score-based fusion
//! - Concurrent upstream searches with a shared deadline
//! - Pluggable strategies through [`FusionStrategy`]
//!
//! # Example
//!
//! ```rust,ignore
//! use fusion_query::{FusionEngine, FusionAlgorithm, ResultSet};
//!
//! let vector = ResultSet::from_scores([("a", 0.92), ("b", 0.90)]);
//! let keyword = ResultSet::from_scores([("b", 7.1), ("c", 2.4)]);
//!
//! let engine = FusionEngine::default();
//! let fused = engine.fuse(&vector, &keyword, 0.5, 10, FusionAlgorithm::RelativeScoreFusion)?;
//! ```

mod engine;
mod fusion;
mod normalize;
mod over_search;
mod searcher;

pub use engine::{validate_alpha, validate_limit, FusionEngine};
pub use fusion::{weighted_merge, FusionStrategy, RankedFusion, RelativeScoreFusion};
pub use normalize::{min_max_scores, rank_score, rank_scores, DEFAULT_RANK_K};
pub use over_search::OverSearchPolicy;
pub use searcher::HybridSearcher;

// Re-export for convenience
pub use fusion_core::{
    FusedResultList, FusionAlgorithm, FusionConfig, FusionError, HybridHit, HybridQuery, ObjectId,
    ResultSet, SearchHit,
};
