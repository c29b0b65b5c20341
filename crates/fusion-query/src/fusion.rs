//! Fusion strategies for combining vector and keyword results.
//!
//! Every strategy follows the same shape: normalize each result set onto
//! a common scale, then merge by object id with
//!
//! fused = alpha * vector + (1 - alpha) * keyword
//!
//! where a source that did not return the object contributes 0.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use fusion_core::{FusionAlgorithm, HybridHit, ObjectId, ResultSet};

use crate::normalize::{min_max_scores, rank_scores, DEFAULT_RANK_K};

/// A way of turning two scored result sets into one ranking.
pub trait FusionStrategy: Send + Sync {
    /// Name reported in fused output.
    fn name(&self) -> &'static str;

    /// Normalized scores aligned with `results.hits()`.
    fn normalize(&self, results: &ResultSet) -> Vec<f32>;

    /// Whether the strategy is sensitive to sample composition and
    /// benefits from fetching extra candidates.
    fn wants_over_search(&self) -> bool {
        false
    }

    /// Merge both result sets into hits sorted by fused score.
    ///
    /// Inputs must already be free of duplicate ids and `alpha` must be
    /// within `[0, 1]`; the engine checks both.
    fn fuse(&self, vector: &ResultSet, keyword: &ResultSet, alpha: f32) -> Vec<HybridHit> {
        let vector_scores = self.normalize(vector);
        let keyword_scores = self.normalize(keyword);
        weighted_merge(vector, &vector_scores, keyword, &keyword_scores, alpha)
    }
}

/// Rank-based fusion: `1 / (k + rank)` per source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedFusion {
    k: f32,
}

impl RankedFusion {
    /// Create ranked fusion with rank offset `k`.
    pub fn new(k: u32) -> Self {
        Self { k: k as f32 }
    }

    /// The rank offset.
    pub fn k(&self) -> f32 {
        self.k
    }
}

impl Default for RankedFusion {
    fn default() -> Self {
        Self { k: DEFAULT_RANK_K }
    }
}

impl FusionStrategy for RankedFusion {
    fn name(&self) -> &'static str {
        FusionAlgorithm::RankedFusion.as_str()
    }

    fn normalize(&self, results: &ResultSet) -> Vec<f32> {
        rank_scores(results, self.k)
    }
}

/// Score-based fusion over min-max normalized raw scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelativeScoreFusion;

impl FusionStrategy for RelativeScoreFusion {
    fn name(&self) -> &'static str {
        FusionAlgorithm::RelativeScoreFusion.as_str()
    }

    fn normalize(&self, results: &ResultSet) -> Vec<f32> {
        min_max_scores(results)
    }

    fn wants_over_search(&self) -> bool {
        true
    }
}

/// Union both sources by object id and sort by weighted score.
///
/// Hits are collected vector list first, then keyword-only objects in
/// keyword order. The sort is stable, so equal fused scores keep that
/// order and the output is fully deterministic.
pub fn weighted_merge(
    vector: &ResultSet,
    vector_scores: &[f32],
    keyword: &ResultSet,
    keyword_scores: &[f32],
    alpha: f32,
) -> Vec<HybridHit> {
    debug_assert_eq!(vector.len(), vector_scores.len());
    debug_assert_eq!(keyword.len(), keyword_scores.len());

    let mut index: HashMap<&ObjectId, usize> = HashMap::with_capacity(vector.len() + keyword.len());
    let mut hits: Vec<HybridHit> = Vec::with_capacity(vector.len() + keyword.len());

    for (hit, &score) in vector.iter().zip(vector_scores) {
        if let Entry::Vacant(slot) = index.entry(&hit.object_id) {
            slot.insert(hits.len());
            hits.push(HybridHit {
                object_id: hit.object_id.clone(),
                vector_component: score,
                keyword_component: 0.0,
                fused_score: 0.0,
                vector_rank: Some(hit.source_rank),
                keyword_rank: None,
            });
        }
    }

    for (hit, &score) in keyword.iter().zip(keyword_scores) {
        match index.entry(&hit.object_id) {
            Entry::Occupied(slot) => {
                let fused = &mut hits[*slot.get()];
                if fused.keyword_rank.is_none() {
                    fused.keyword_component = score;
                    fused.keyword_rank = Some(hit.source_rank);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(hits.len());
                hits.push(HybridHit {
                    object_id: hit.object_id.clone(),
                    vector_component: 0.0,
                    keyword_component: score,
                    fused_score: 0.0,
                    vector_rank: None,
                    keyword_rank: Some(hit.source_rank),
                });
            }
        }
    }

    let keyword_weight = 1.0 - alpha;
    for hit in &mut hits {
        hit.fused_score = alpha * hit.vector_component + keyword_weight * hit.keyword_component;
    }

    hits.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(hits: &[HybridHit]) -> Vec<&str> {
        hits.iter().map(|h| h.object_id.as_str()).collect()
    }

    #[test]
    fn test_ranked_single_list() {
        let vector = ResultSet::from_scores([("a", 0.9), ("b", 0.8), ("c", 0.7)]);
        let fused = RankedFusion::default().fuse(&vector, &ResultSet::empty(), 0.5);

        assert_eq!(ids(&fused), vec!["a", "b", "c"]);
        assert_eq!(fused[0].fused_score, 0.5 / 61.0);
        assert_eq!(fused[0].keyword_component, 0.0);
        assert_eq!(fused[0].keyword_rank, None);
    }

    #[test]
    fn test_ranked_overlap_wins() {
        let vector = ResultSet::from_scores([("a", 0.9), ("b", 0.8), ("c", 0.7)]);
        let keyword = ResultSet::from_scores([("b", 9.5), ("d", 8.5), ("a", 7.5)]);

        let fused = RankedFusion::default().fuse(&vector, &keyword, 0.5);

        // b is second and first, a is first and third; d outranks c
        assert_eq!(ids(&fused), vec!["b", "a", "d", "c"]);
        assert_eq!(fused[0].vector_rank, Some(1));
        assert_eq!(fused[0].keyword_rank, Some(0));
    }

    #[test]
    fn test_ranked_uses_k() {
        let vector = ResultSet::from_scores([("a", 1.0)]);
        let fused = RankedFusion::new(0).fuse(&vector, &ResultSet::empty(), 1.0);
        assert_eq!(fused[0].fused_score, 1.0);
    }

    #[test]
    fn test_relative_preserves_gaps() {
        let vector = ResultSet::from_scores([("a", 10.0), ("b", 9.0), ("c", 0.0)]);
        let fused = RelativeScoreFusion.fuse(&vector, &ResultSet::empty(), 1.0);

        assert_eq!(fused[0].fused_score, 1.0);
        assert!((fused[1].fused_score - 0.9).abs() < 1e-6);
        assert_eq!(fused[2].fused_score, 0.0);
    }

    #[test]
    fn test_relative_wants_over_search() {
        assert!(RelativeScoreFusion.wants_over_search());
        assert!(!RankedFusion::default().wants_over_search());
    }

    #[test]
    fn test_merge_tie_break_vector_first() {
        // Disjoint singletons normalize to 1 in both sources
        let vector = ResultSet::from_scores([("v", 0.2)]);
        let keyword = ResultSet::from_scores([("k", 14.0)]);

        let fused = RelativeScoreFusion.fuse(&vector, &keyword, 0.5);
        assert_eq!(fused[0].fused_score, fused[1].fused_score);
        assert_eq!(ids(&fused), vec!["v", "k"]);
    }

    #[test]
    fn test_merge_tie_break_keyword_order() {
        let keyword = ResultSet::from_scores([("x", 1.0), ("y", 1.0), ("z", 1.0)]);
        let fused = RelativeScoreFusion.fuse(&ResultSet::empty(), &keyword, 0.0);
        assert_eq!(ids(&fused), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_merge_empty() {
        let fused = RankedFusion::default().fuse(&ResultSet::empty(), &ResultSet::empty(), 0.5);
        assert!(fused.is_empty());
    }
}
