//! Error types for plan parsing

use thiserror::Error;

/// Errors that make an EXPLAIN source structurally unparseable.
///
/// These are fatal: when one is returned, no partial tree exists and the
/// caller is expected to fall back to showing the raw source. Recoverable
/// anomalies (an unresolved shared-subplan reference, a statistic that did
/// not parse) are not errors; they leave markers on the affected node or
/// simply leave a field unset.
#[derive(Debug, Error)]
pub enum MalformedPlanError {
    #[error("no plan content left after normalization")]
    EmptyInput,

    #[error("invalid JSON plan: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid plan structure: {0}")]
    InvalidStructure(String),

    #[error("plan nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Result type alias for plan parsing operations
pub type Result<T> = std::result::Result<T, MalformedPlanError>;
