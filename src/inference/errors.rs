//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type used by the
//! covariance estimator. It groups domain-specific failures (a singular
//! information matrix, an unusable reference distribution) with errors
//! bubbling up from the numerical layer. An alias `InferenceResult<T>`
//! standardizes the return type across inference code.
use crate::optimization::errors::OptError;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Covariance ----
    /// The information matrix (negated Hessian) could not be inverted.
    SingularInformation {
        dim: usize,
    },

    /// Student's t reference distribution could not be built.
    InvalidReference {
        df: f64,
        reason: String,
    },

    // ---- Numerical layer ----
    /// Hessian evaluation or dimension checks failed.
    Opt(OptError),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Opt(err)
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Covariance ----
            InferenceError::SingularInformation { dim } => write!(
                f,
                "Inference Error: {dim}x{dim} information matrix is singular; \
                 the likelihood may be flat in some direction at the estimate"
            ),
            InferenceError::InvalidReference { df, reason } => {
                write!(f, "Inference Error: t distribution with {df} df unavailable: {reason}")
            }

            // ---- Numerical layer ----
            InferenceError::Opt(err) => write!(f, "Inference Error: {err}"),
        }
    }
}
