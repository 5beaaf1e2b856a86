/// Error types for analytics requests
use thiserror::Error;

/// A request parameter that is rejected before any computation runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    /// Percentile outside 0..=100
    #[error("Percentile must be between 0 and 100, got {0}")]
    InvalidPercentile(i32),

    /// Comparison operator other than greater/less
    #[error("Unknown operator '{0}', expected 'greater' or 'less'")]
    UnknownOperator(String),

    /// Grouping mode that the engine does not know
    #[error("Unknown grouping mode '{0}'")]
    UnknownGroupKey(String),
}

/// Type alias for Results using AnalysisError
pub type Result<T> = std::result::Result<T, AnalysisError>;
