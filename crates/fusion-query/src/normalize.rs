//! Score normalizers.
//!
//! Each normalizer maps a result set onto a comparable scale and returns
//! one score per hit, aligned with [`ResultSet::hits`].

use fusion_core::ResultSet;

/// Default rank offset for rank-based scoring (commonly 60).
/// Higher values flatten the gap between top and lower ranks.
pub const DEFAULT_RANK_K: f32 = 60.0;

/// Score of a 0-based rank: `1 / (k + rank + 1)`.
///
/// Strictly positive and strictly decreasing in `rank` for any `k >= 0`.
pub fn rank_score(rank: usize, k: f32) -> f32 {
    1.0 / (k + rank as f32 + 1.0)
}

/// Rank-based scores; raw magnitudes are ignored.
pub fn rank_scores(results: &ResultSet, k: f32) -> Vec<f32> {
    results
        .iter()
        .map(|hit| rank_score(hit.source_rank, k))
        .collect()
}

/// Min-max scaled scores in `[0, 1]`.
///
/// The highest raw score maps to exactly 1 and the lowest to exactly 0.
/// When every score is equal (including a single hit) all hits get 1.
pub fn min_max_scores(results: &ResultSet) -> Vec<f32> {
    if results.is_empty() {
        return Vec::new();
    }

    // f64 so that extreme f32 magnitudes cannot overflow the range
    let (min, max) = results.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), hit| {
            let score = f64::from(hit.raw_score);
            (min.min(score), max.max(score))
        },
    );
    let range = max - min;

    results
        .iter()
        .map(|hit| {
            if range > 0.0 {
                let norm = (f64::from(hit.raw_score) - min) / range;
                norm.clamp(0.0, 1.0) as f32
            } else {
                1.0
            }
        })
        .collect()
}
