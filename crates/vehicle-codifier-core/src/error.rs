//! Error types for the vehicle codification pipeline.
//!
//! Errors are organized by stage. Most pipeline failures are recovered
//! locally (extraction, filtering, reranking, and scoring all have
//! fallbacks) and never reach the caller; only genuine input errors and
//! configuration errors propagate.

use thiserror::Error;

/// Top-level error type for codifier operations.
#[derive(Error, Debug)]
pub enum CodifierError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid (weight sum, threshold ordering, ...)
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Request-level and internal pipeline errors.
///
/// Most of these variants are caught and degraded at the call site per
/// the fallback rules in each component; only `InvalidInput` is expected
/// to surface to the caller of `match_vehicle`.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or unparseable year/description on the request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The active snapshot has no rows for the requested year.
    #[error("no catalog data for year {year}")]
    NoCatalogData { year: i32 },

    /// An LLM call failed, timed out, or returned output that failed to parse.
    #[error("LLM call failed in {stage}: {message}")]
    LlmUnavailable {
        stage: String,
        message: String,
        status_code: Option<u16>,
    },

    /// An embedding service call failed or timed out.
    #[error("embedding service failed: {message}")]
    EmbeddingUnavailable { message: String },

    /// A stage did not complete before the request deadline.
    #[error("timeout in {stage} stage after {elapsed_ms}ms")]
    Timeout { stage: String, elapsed_ms: u64 },
}

impl PipelineError {
    /// Whether this error is recoverable by a local fallback rather than by
    /// propagating to the caller. `InvalidInput` and `NoCatalogData` are not
    /// recoverable; everything else has a defined degradation path.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::NoCatalogData { .. }
        )
    }
}

/// Convenience type alias for codifier results.
pub type Result<T> = std::result::Result<T, CodifierError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
