//! inference — uncertainty and model-comparison measures for fitted models.
//!
//! Purpose
//! -------
//! Provide the post-estimation layer on top of a maximum-likelihood fit:
//! Hessian-based covariance with per-parameter t tests, and likelihood-based
//! information criteria.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for inference-specific failures (singular
//!   information, unusable reference distribution) and numerical errors
//!   forwarded from the optimizer layer.
//! - Estimate the covariance of `θ̂` as the inverse of the observed
//!   information (negated numerical Hessian) via [`estimate_covariance`],
//!   returning a [`ParameterTable`].
//! - Summarize a fit with [`InfoCriteria`] (AIC, AICc, BIC).
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters `θ` are in the same space the model's log-likelihood is
//!   written in; no reparameterization happens here.
//! - All routines return [`InferenceError`] on failure rather than
//!   panicking.
//!
//! Downstream usage
//! ----------------
//! - `maximize` calls [`estimate_covariance`] when `want_covariance` is set
//!   and stores the result (success or failure) on the outcome; callers
//!   may also invoke it directly on any estimate.
//!
//! Testing notes
//! -------------
//! - Unit tests use quadratic log-likelihoods whose covariance is known in
//!   closed form; integration tests check the normal model's standard
//!   errors against `σ / √n`.

pub mod covariance;
pub mod errors;
pub mod info_criteria;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::covariance::{ParameterTable, estimate_covariance};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::info_criteria::InfoCriteria;

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use rust_mle::inference::prelude::*;` to
// import the primary inference surface in a single line.

pub mod prelude {
    pub use super::covariance::{ParameterTable, estimate_covariance};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::info_criteria::InfoCriteria;
}
