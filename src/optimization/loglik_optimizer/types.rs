//! loglik_optimizer::types — shared numeric aliases, constants and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the core numeric types, documented constants and back-end
//! solver aliases used by the log-likelihood search engine. By defining these
//! in one place, the rest of the optimization code can stay agnostic to
//! `ndarray` and Argmin generics and can more easily evolve if the backend
//! changes.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients, Hessians,
//!   and scalar costs (`Theta`, `Grad`, `Hessian`, `Cost`).
//! - Provide a standard map type for Argmin function-evaluation counters
//!   (`FnEvalMap`).
//! - Expose pre-wired aliases for the argmin gradient back ends
//!   (Fletcher–Reeves / Polak–Ribière conjugate gradient, BFGS) and the two
//!   line searches, all over the common `(Theta, Grad, Cost)` shapes.
//! - Collect the documented constants of the engine (default differencing
//!   step, iteration cap, default tolerances, restart bound).
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors and matrices are `ndarray` containers over `f64`.
//! - `Cost` is always the *minimized* quantity `c(θ) = -ℓ(θ) + penalty(θ)`;
//!   higher layers flip signs back to log-likelihood space.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` are column vectors with length equal to the number of
//!   free parameters; `Hessian` is `theta.len() × theta.len()`.
//! - This module defines no runtime behavior.
//!
//! Testing notes
//! -------------
//! - Only aliases and constants live here; correctness is exercised by the
//!   surrounding optimizer modules.
use argmin::solver::{
    conjugategradient::{NonlinearConjugateGradient, beta::FletcherReeves, beta::PolakRibiere},
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::BFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ` for log-likelihood optimization.
///
/// Alias for `ndarray::Array1<f64>`, used as the canonical parameter type
/// throughout the optimizer.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)` for optimization.
///
/// Alias for `ndarray::Array1<f64>`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Dense Hessian matrix for second-order information.
///
/// Alias for `ndarray::Array2<f64>`; `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value used by the optimizer.
///
/// In this crate, this is the penalized cost `c(θ) = -ℓ(θ) + penalty(θ)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Step used by central differences in gradients and Hessians.
pub const DEFAULT_DELTA: f64 = 1e-4;

/// Iteration cap applied when the caller does not override `max_iter`.
pub const DEFAULT_MAX_ITER: usize = 1500;

/// Iterations without a `tolerance`-sized improvement of the best cost
/// after which a gradient search counts as converged.
pub const STALL_ITERS: usize = 10;

/// Default stopping tolerance (gradient ∞-norm or simplex size).
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Default simplex edge / annealing step budget.
pub const DEFAULT_STEP_SIZE: f64 = 0.05;

/// Componentwise magnitude above which a restart treats a point as diverged.
pub const RESTART_BOUND: f64 = 1e4;

/// Fill value of the default starting point for the simplex search.
pub const SIMPLEX_START: f64 = 0.0;

/// Fill value of the default starting point for gradient searches.
///
/// Deliberately non-zero: many likelihoods have a degenerate gradient at 0.
pub const GRADIENT_START: f64 = 0.1;

/// Fill value of the default starting point for simulated annealing.
pub const ANNEALING_START: f64 = 1.0;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// Fletcher–Reeves nonlinear conjugate gradient over line search `L`.
pub type FletcherReevesCG<L> = NonlinearConjugateGradient<Theta, L, FletcherReeves, Cost>;

/// Polak–Ribière nonlinear conjugate gradient over line search `L`.
pub type PolakRibiereCG<L> = NonlinearConjugateGradient<Theta, L, PolakRibiere, Cost>;

/// BFGS quasi-Newton search over line search `L`.
pub type Bfgs<L> = BFGS<L, Cost>;
