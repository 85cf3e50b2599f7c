//! rust_mle — constrained maximum-likelihood estimation on argmin.
//!
//! Purpose
//! -------
//! Fit statistical models by maximizing their log-likelihood with a choice
//! of interchangeable search back ends, then report the estimate together
//! with Hessian-based standard errors and information criteria.
//!
//! Key behaviors
//! -------------
//! - [`data`]: the [`data::Dataset`] trait models are fitted on (observation
//!   and column counts) and a small regression container.
//! - [`optimization`]: the [`optimization::loglik_optimizer::LogLikelihood`]
//!   trait, [`optimization::loglik_optimizer::maximize`], restarts,
//!   coordinate cycling, and the [`optimization::errors::OptError`] surface.
//! - [`inference`]: covariance from the numerical Hessian, per-parameter t
//!   tests, and AIC/AICc/BIC.
//!
//! Invariants & assumptions
//! ------------------------
//! - All fallible operations return `Result`; library code does not panic on
//!   bad input.
//! - Searches are single-threaded and deterministic for a given method,
//!   start and (for annealing) seed.
//!
//! Downstream usage
//! ----------------
//! - Implement `LogLikelihood` for a model type, build an `MLEOptions`, and
//!   call `maximize(&model, &data, &opts)`; set `want_covariance` to get a
//!   `ParameterTable` on the outcome.
//! - `optimization::prelude::*` and `inference::prelude::*` import the
//!   common surface in one line each.

pub mod data;
pub mod inference;
pub mod optimization;
