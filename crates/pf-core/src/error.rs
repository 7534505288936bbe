//! Error types for PsyFit

use std::time::Duration;
use thiserror::Error;

/// PsyFit error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed construction input (bad counts, empty experiment, shape mismatch)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Setter given an out-of-domain value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Fitted parameters requested before a successful fit
    #[error("Model has not been fitted yet; call fit() first")]
    NotFitted,

    /// Optimizer failed to converge
    #[error("Optimization error: {0}")]
    Optimization(String),

    /// Optimizer exceeded its wall-clock budget
    #[error("Optimization timed out after {0:?}")]
    Timeout(Duration),

    /// Likelihood evaluated outside its numeric domain
    #[error("Numeric domain error: {0}")]
    NumericDomain(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
