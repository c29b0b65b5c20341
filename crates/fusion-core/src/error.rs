//! Error types for the fusion system.

use thiserror::Error;

use crate::types::SourceKind;

/// Result type alias using FusionError.
pub type Result<T> = std::result::Result<T, FusionError>;

/// Errors that can occur while fusing hybrid search results.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Fusion weight outside `[0, 1]` (or NaN).
    #[error("Invalid weight: alpha must be within [0, 1], got {alpha}")]
    InvalidWeight { alpha: f32 },

    /// Result limit of zero or above the configured maximum.
    #[error("Invalid limit: {limit} ({reason})")]
    InvalidLimit { limit: usize, reason: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A collaborator returned a NaN or infinite raw score.
    #[error("Non-finite score {score} for object {object_id} in {kind} results")]
    NonFiniteScore {
        kind: SourceKind,
        object_id: String,
        score: f32,
    },

    /// A collaborator returned the same object id more than once.
    #[error("Malformed {kind} result set: {duplicates} duplicate object id(s), first {object_id}")]
    MalformedResultSet {
        kind: SourceKind,
        object_id: String,
        duplicates: usize,
    },

    /// An upstream search errored or missed its deadline.
    #[error("Upstream {kind} search failed: {reason}")]
    UpstreamFailure { kind: SourceKind, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FusionError {
    /// Create an invalid weight error.
    pub fn invalid_weight(alpha: f32) -> Self {
        Self::InvalidWeight { alpha }
    }

    /// Create an invalid limit error.
    pub fn invalid_limit(limit: usize, reason: impl Into<String>) -> Self {
        Self::InvalidLimit {
            limit,
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an upstream failure error.
    pub fn upstream(kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error came from a search collaborator rather than
    /// from the caller's parameters.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamFailure { .. })
    }

    /// Get the stable error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWeight { .. } => "INVALID_WEIGHT",
            Self::InvalidLimit { .. } => "INVALID_LIMIT",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::NonFiniteScore { .. } => "NON_FINITE_SCORE",
            Self::MalformedResultSet { .. } => "MALFORMED_RESULT_SET",
            Self::UpstreamFailure { .. } => "UPSTREAM_FAILURE",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
