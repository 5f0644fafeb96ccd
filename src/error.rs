//! Error types for the kluster crate

use std::time::Duration;
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during ingestion, fitting and prediction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// One or more required columns are absent from the input table
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumn {
        /// Every missing column name, in schema order
        columns: Vec<String>,
    },

    /// A categorical cell holds something other than 0 or 1
    #[error("Invalid categorical value {value:?} in column '{column}' at row {row}; expected 0 or 1")]
    InvalidCategoricalValue {
        /// Column name
        column: String,
        /// Zero-based row index
        row: usize,
        /// Offending cell content
        value: String,
    },

    /// A numeric feature has zero variance over the training batch
    #[error("Numeric feature '{feature}' has zero variance and cannot be standardized")]
    ZeroVarianceFeature {
        /// Feature name
        feature: String,
    },

    /// Fewer distinct records than requested clusters
    #[error("Insufficient data: {required} distinct records required, found {actual}")]
    InsufficientData {
        /// Distinct records required (the cluster count)
        required: usize,
        /// Distinct records available
        actual: usize,
    },

    /// A cluster ended empty on every restart
    #[error("Cluster {cluster} was empty after convergence on all {restarts} restarts")]
    DegenerateCluster {
        /// Lowest index of a cluster that was empty on the final restart
        cluster: usize,
        /// Number of restarts attempted
        restarts: usize,
    },

    /// Prediction requested before a successful fit
    #[error("Model has not been fitted")]
    ModelNotFitted,

    /// Fitting exceeded the configured timeout
    #[error("Fit aborted after {elapsed:?}: {completed_restarts} of {requested_restarts} restarts completed")]
    Aborted {
        /// Restarts that ran to completion before the deadline
        completed_restarts: usize,
        /// Restarts requested
        requested_restarts: usize,
        /// Wall time spent before aborting
        elapsed: Duration,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Error message
        message: String,
    },

    /// Empty or malformed data
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message
        message: String,
    },

    /// Vector or matrix width does not match the fitted layout
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// What was being checked
        what: &'static str,
        /// Expected width
        expected: usize,
        /// Actual width
        found: usize,
    },

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a new InvalidParameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new InvalidData error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a new DimensionMismatch error
    pub fn dimension_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            found,
        }
    }
}
