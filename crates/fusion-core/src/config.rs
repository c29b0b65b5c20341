//! Configuration types for the fusion system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FusionError, Result};
use crate::types::FusionAlgorithm;

/// Main configuration for hybrid fusion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Fusion defaults applied when a query leaves them unset.
    #[serde(default)]
    pub search: SearchConfig,

    /// Candidate oversampling for score-based fusion.
    #[serde(default)]
    pub over_search: OverSearchConfig,

    /// Upstream search behaviour.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default fusion algorithm.
    #[serde(default)]
    pub algorithm: FusionAlgorithm,

    /// Default alpha (0 = keyword only, 1 = vector only).
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Default number of results.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Maximum number of results.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Rank offset k in `1 / (k + rank)` for ranked fusion.
    #[serde(default = "default_rank_k")]
    pub rank_k: u32,

    /// Fail on duplicate object ids instead of dropping repeats.
    #[serde(default)]
    pub strict_result_sets: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: FusionAlgorithm::RankedFusion,
            alpha: 0.5,
            default_limit: 10,
            max_limit: 100,
            rank_k: 60,
            strict_result_sets: false,
        }
    }
}

/// Over-search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverSearchConfig {
    /// Request extra candidates for relative score fusion.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Multiplier applied to the result limit.
    #[serde(default = "default_over_search_factor")]
    pub factor: usize,

    /// Lower bound on the number of candidates requested.
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
}

impl Default for OverSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: 2,
            min_candidates: 20,
        }
    }
}

/// Upstream search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Deadline covering both searches, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fuse the surviving source alone when exactly one search fails.
    #[serde(default)]
    pub single_source_fallback: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            single_source_fallback: false,
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_alpha() -> f32 {
    0.5
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_rank_k() -> u32 {
    60
}

fn default_over_search_factor() -> usize {
    2
}

fn default_min_candidates() -> usize {
    20
}

fn default_timeout_ms() -> u64 {
    5000
}

impl FusionConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FusionError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        debug!("Loaded fusion config from {:?}", path);
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("hybrid-fusion").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("hybrid-fusion.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FusionError::config(format!("Failed to render config: {}", e)))
    }

    /// Check that every value is within its allowed range.
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if !(0.0..=1.0).contains(&search.alpha) {
            return Err(FusionError::config(format!(
                "search.alpha must be within [0, 1], got {}",
                search.alpha
            )));
        }
        if search.max_limit == 0 {
            return Err(FusionError::config("search.max_limit must be positive"));
        }
        if search.default_limit == 0 || search.default_limit > search.max_limit {
            return Err(FusionError::config(format!(
                "search.default_limit must be within [1, {}], got {}",
                search.max_limit, search.default_limit
            )));
        }
        if self.over_search.factor == 0 {
            return Err(FusionError::config("over_search.factor must be at least 1"));
        }
        if self.upstream.timeout_ms == 0 {
            return Err(FusionError::config("upstream.timeout_ms must be positive"));
        }
        Ok(())
    }
}
