//! Analytics error types.

use thiserror::Error;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A record could not be interpreted
    #[error("Invalid input at record {index}: {reason}")]
    InvalidInput {
        /// Position of the offending record in the caller's slice
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Too few data points for the requested computation
    #[error("Insufficient data: need at least {required} points, have {available}")]
    InsufficientData {
        /// Minimum number of points
        required: usize,
        /// Points actually available
        available: usize,
    },

    /// Typed record could not be converted to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
