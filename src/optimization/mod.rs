//! optimization — maximum-likelihood search and its error surface.
//!
//! Purpose
//! -------
//! Provide the estimation layer: an argmin-backed log-likelihood optimizer
//! (`loglik_optimizer`) and a single error/result surface
//! (`errors::OptError`, `OptResult<T>`) shared with the inference layer.
//!
//! Key behaviors
//! -------------
//! - Expose [`loglik_optimizer::maximize`] and friends for maximizing
//!   `ℓ(θ)` under model-supplied constraints.
//! - Normalize configuration issues, numerical failures, and back-end solver
//!   errors into [`errors::OptError`].
//!
//! Conventions
//! -----------
//! - All solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing
//!   values are log-likelihoods.
//! - Progress output is opt-in (`MLEOptions::verbose`) and goes through the
//!   slog observer when the `obs_slog` feature is enabled; the search itself
//!   performs no other I/O.

pub mod errors;
pub mod loglik_optimizer;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_mle::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
