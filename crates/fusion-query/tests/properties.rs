//! Property tests for the fusion engine.

use std::collections::HashSet;

use fusion_query::{
    min_max_scores, FusedResultList, FusionAlgorithm, FusionEngine, ResultSet,
};
use proptest::prelude::*;

const ALGORITHMS: [FusionAlgorithm; 2] = [
    FusionAlgorithm::RankedFusion,
    FusionAlgorithm::RelativeScoreFusion,
];

/// Unique ids over a small alphabet so vector and keyword sets overlap,
/// sorted by descending score like a real search source.
fn arb_scored() -> impl Strategy<Value = Vec<(String, f32)>> {
    prop::collection::vec((0u8..40, -100.0f32..100.0), 0..24).prop_map(|raw| {
        let mut seen = HashSet::new();
        let mut scored: Vec<(String, f32)> = raw
            .into_iter()
            .filter(|(id, _)| seen.insert(*id))
            .map(|(id, score)| (format!("obj-{id}"), score))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    })
}

fn to_set(scored: &[(String, f32)]) -> ResultSet {
    scored.iter().map(|(id, s)| (id.as_str(), *s)).collect()
}

fn ids(list: &FusedResultList) -> Vec<String> {
    list.iter().map(|h| h.object_id.to_string()).collect()
}

fn fuse_all(
    vector: &ResultSet,
    keyword: &ResultSet,
    alpha: f32,
    algorithm: FusionAlgorithm,
) -> FusedResultList {
    FusionEngine::default()
        .fuse(vector, keyword, alpha, usize::MAX, algorithm)
        .unwrap()
}

proptest! {
    #[test]
    fn ranked_fusion_ignores_magnitude(
        vector in arb_scored(),
        keyword in arb_scored(),
        alpha in 0.0f32..=1.0,
        scale in 0.001f32..1000.0,
    ) {
        let rescale = |scored: &[(String, f32)]| -> Vec<(String, f32)> {
            scored.iter().map(|(id, s)| (id.clone(), s * scale - 7.0)).collect()
        };

        let original = fuse_all(&to_set(&vector), &to_set(&keyword), alpha, FusionAlgorithm::RankedFusion);
        let rescaled = fuse_all(
            &to_set(&rescale(&vector)),
            &to_set(&rescale(&keyword)),
            alpha,
            FusionAlgorithm::RankedFusion,
        );

        prop_assert_eq!(original.fingerprint(), rescaled.fingerprint());
    }

    #[test]
    fn min_max_hits_both_bounds(scored in arb_scored()) {
        let set = to_set(&scored);
        let norm = min_max_scores(&set);
        prop_assert_eq!(norm.len(), set.len());

        if set.len() > 1 && scored[0].1 != scored[scored.len() - 1].1 {
            prop_assert_eq!(norm[0], 1.0);
            prop_assert_eq!(norm[norm.len() - 1], 0.0);
        }
        prop_assert!(norm.iter().all(|n| (0.0..=1.0).contains(n)));
    }

    #[test]
    fn alpha_one_follows_vector_order(
        vector in arb_scored(),
        keyword in arb_scored(),
    ) {
        let vector_ids: Vec<String> = vector.iter().map(|(id, _)| id.clone()).collect();
        let in_vector: HashSet<&String> = vector_ids.iter().collect();
        let keyword_only: Vec<String> = keyword
            .iter()
            .map(|(id, _)| id.clone())
            .filter(|id| !in_vector.contains(id))
            .collect();

        let expected: Vec<String> = vector_ids.iter().cloned().chain(keyword_only).collect();

        for algorithm in ALGORITHMS {
            let fused = fuse_all(&to_set(&vector), &to_set(&keyword), 1.0, algorithm);
            prop_assert_eq!(ids(&fused), expected.clone());
        }
    }

    #[test]
    fn alpha_zero_follows_keyword_order(
        vector in arb_scored(),
        keyword in arb_scored(),
    ) {
        let keyword_ids: Vec<String> = keyword.iter().map(|(id, _)| id.clone()).collect();

        let ranked = fuse_all(&to_set(&vector), &to_set(&keyword), 0.0, FusionAlgorithm::RankedFusion);
        let ranked_ids = ids(&ranked);
        prop_assert_eq!(&ranked_ids[..keyword_ids.len()], &keyword_ids[..]);

        let relative = fuse_all(&to_set(&vector), &to_set(&keyword), 0.0, FusionAlgorithm::RelativeScoreFusion);
        for hit in relative.iter() {
            prop_assert_eq!(hit.fused_score, hit.keyword_component);
        }
    }

    #[test]
    fn fusion_is_idempotent(
        vector in arb_scored(),
        keyword in arb_scored(),
        alpha in 0.0f32..=1.0,
        limit in 1usize..30,
    ) {
        let engine = FusionEngine::default();
        let (vector, keyword) = (to_set(&vector), to_set(&keyword));

        for algorithm in ALGORITHMS {
            let first = engine.fuse(&vector, &keyword, alpha, limit, algorithm).unwrap();
            let second = engine.fuse(&vector, &keyword, alpha, limit, algorithm).unwrap();
            prop_assert_eq!(first.fingerprint(), second.fingerprint());
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn output_is_bounded_sorted_and_sourced(
        vector in arb_scored(),
        keyword in arb_scored(),
        alpha in 0.0f32..=1.0,
        limit in 1usize..30,
    ) {
        let engine = FusionEngine::default();
        let union: HashSet<String> = vector
            .iter()
            .chain(keyword.iter())
            .map(|(id, _)| id.clone())
            .collect();

        for algorithm in ALGORITHMS {
            let fused = engine
                .fuse(&to_set(&vector), &to_set(&keyword), alpha, limit, algorithm)
                .unwrap();

            prop_assert!(fused.len() <= limit);
            prop_assert!(fused.len() <= union.len());
            prop_assert_eq!(fused.len(), limit.min(union.len()));

            let distinct: HashSet<String> = ids(&fused).into_iter().collect();
            prop_assert_eq!(distinct.len(), fused.len());
            prop_assert!(distinct.is_subset(&union));

            prop_assert!(fused
                .hits
                .windows(2)
                .all(|pair| pair[0].fused_score >= pair[1].fused_score));
        }
    }

    #[test]
    fn relative_scores_stay_in_unit_range(
        vector in arb_scored(),
        keyword in arb_scored(),
        alpha in 0.0f32..=1.0,
    ) {
        let fused = fuse_all(&to_set(&vector), &to_set(&keyword), alpha, FusionAlgorithm::RelativeScoreFusion);
        for hit in fused.iter() {
            prop_assert!(hit.fused_score >= 0.0);
            prop_assert!(hit.fused_score <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn empty_keyword_keeps_vector_ranking(
        vector in arb_scored(),
        alpha in 0.0f32..1.0,
    ) {
        let vector_ids: Vec<String> = vector.iter().map(|(id, _)| id.clone()).collect();

        for algorithm in ALGORITHMS {
            let fused = fuse_all(&to_set(&vector), &ResultSet::empty(), alpha, algorithm);
            prop_assert_eq!(ids(&fused), vector_ids.clone());
            prop_assert!(fused.iter().all(|h| h.keyword_component == 0.0));
        }
    }
}
