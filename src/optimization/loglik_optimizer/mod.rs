//! loglik_optimizer — constrained maximum-likelihood search on argmin.
//!
//! Purpose
//! -------
//! Maximize a user-provided log-likelihood `ℓ(θ)` with one of several
//! interchangeable back ends (Nelder–Mead simplex, Fletcher–Reeves and
//! Polak–Ribière conjugate gradient, BFGS, simulated annealing). Callers
//! implement a single trait, [`LogLikelihood`], pick a [`Method`], and call
//! [`maximize`].
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into an argmin cost `c(θ) = -ℓ(θ)` via
//!   [`adapter::ArgMinAdapter`], which also applies the model's constraint
//!   penalty (`c = -ℓ(θ') + penalty` at the corrected point `θ'`).
//! - Fall back to central-difference gradients ([`finite_diff`]) when the
//!   model has no analytic gradient, when the constraint is active, or when
//!   the method forces numerical derivatives.
//! - Dispatch on [`Method`] (integer code table `outer*100 + inner`) in
//!   [`api`]; back ends are assembled in [`builders`], [`simplex`] and
//!   [`annealing`], and stepped by the shared driver in [`run`].
//! - Optional extras: search-path tracing ([`trace`]), coordinate cycling
//!   ([`cycle`]) and restarting with another method ([`restart`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** `ℓ(θ)` by minimizing `c(θ)`; models
//!   implement `ℓ(θ)` and `∇ℓ(θ)`, never the cost.
//! - The parameter dimension is resolved once per run ([`ParamDim`]) and is
//!   fixed for the whole search.
//! - Options are validated before any evaluation; invalid configuration is
//!   an [`OptError`], never a panic.
//!
//! Conventions
//! -----------
//! - Parameters are plain [`Theta`] (`Array1<f64>`); constraints are
//!   expressed by the model through [`LogLikelihood::constraint`].
//! - Everything user-facing ([`OptimOutcome::value`], the traced path) is in
//!   log-likelihood units.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions and penalties
//!   ([`adapter`]), solver wiring ([`builders`]), the driver ([`run`]),
//!   annealing moves ([`annealing`]), simplex size ([`simplex`]), derivative helpers ([`finite_diff`]),
//!   restart selection ([`restart`]) and cycling ([`cycle`]).
//! - Integration tests fit a normal location-scale model with every method.
//!
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod annealing;
pub mod api;
pub mod builders;
pub mod cycle;
pub mod finite_diff;
pub mod restart;
pub mod run;
pub mod simplex;
pub mod trace;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{maximize, maximize_with_rng};
pub use self::restart::{StartFrom, restart, restart_with_rng};
pub use self::trace::SearchPath;
pub use self::traits::{
    Algorithm, AnnealSchedule, LineSearcher, LogLikelihood, MLEOptions, Method, OptimOutcome,
    ParamDim, Penalty, SearchStatus,
};
pub use self::types::{Cost, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_mle::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::{maximize, maximize_with_rng};
    pub use super::restart::{StartFrom, restart};
    pub use super::traits::{
        LogLikelihood, MLEOptions, Method, OptimOutcome, ParamDim, Penalty, SearchStatus,
    };
    pub use super::types::{Cost, Grad, Theta};
}
