//! loglik_optimizer::builders — back-end solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the argmin solvers behind each
//! [`Algorithm`]. These helpers hide Argmin's generic wiring and apply
//! crate-level options (tolerance, step size) so that the dispatch layer can
//! request a configured solver without touching Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Build the Nelder–Mead simplex from the starting point plus `step_size`
//!   along each axis, stopping once its size is below `opts.tolerance`.
//! - Build Fletcher–Reeves / Polak–Ribière conjugate gradient and BFGS over
//!   either line search ([`MoreThuenteLS`] or [`HagerZhangLS`]).
//! - Build the BFGS starting state with an identity inverse Hessian.
//!
//! Invariants & assumptions
//! ------------------------
//! - All solvers operate on the canonical numeric types [`Theta`], [`Grad`]
//!   and [`Cost`].
//! - Options have already passed `MLEOptions::validate`; Argmin's own
//!   rejections are still surfaced as [`OptError`] via `From<Error>`.
//!
//! Conventions
//! -----------
//! - Builders do **not** set `max_iters`; the runner applies it to the state.
//! - Conjugate-gradient searches use a More–Thuente line search with the
//!   strong-Wolfe curvature constant `c2 = 0.1` and restart to steepest
//!   descent every `dim` iterations or when successive gradients lose
//!   orthogonality.
//!
//! Testing notes
//! -------------
//! - Unit tests check the simplex geometry and that every builder accepts
//!   valid options; full solves run in the integration tests.
//!
//! [`Algorithm`]: crate::optimization::loglik_optimizer::Algorithm
//! [`OptError`]: crate::optimization::errors::OptError
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        simplex::NelderMeadSimplex,
        traits::MLEOptions,
        types::{
            Bfgs, Cost, FletcherReevesCG, Grad, HagerZhangLS, Hessian, MoreThuenteLS,
            PolakRibiereCG, Theta,
        },
    },
};
use argmin::{
    core::{IterState, State},
    solver::{
        conjugategradient::{
            NonlinearConjugateGradient,
            beta::{FletcherReeves, PolakRibiere},
        },
        quasinewton::BFGS,
    },
};

/// Orthogonality threshold below which conjugate gradient restarts.
const CG_RESTART_ORTHOGONALITY: f64 = 0.1;

/// Vertices of the initial simplex: `theta0` and `theta0 + step · eᵢ`.
pub fn simplex_vertices(theta0: &Theta, step: f64) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] += step;
        vertices.push(vertex);
    }
    vertices
}

/// Nelder–Mead around `theta0` with edge `opts.step_size`, converged once
/// the simplex size is below `opts.tolerance`.
pub fn build_simplex(theta0: &Theta, opts: &MLEOptions) -> NelderMeadSimplex {
    NelderMeadSimplex::new(simplex_vertices(theta0, opts.step_size), opts.tolerance)
}

/// More–Thuente line search tuned for conjugate directions.
pub fn more_thuente_for_cg() -> OptResult<MoreThuenteLS> {
    Ok(MoreThuenteLS::new().with_c(1e-4, 0.1)?)
}

/// More–Thuente line search with Argmin's defaults (used by BFGS).
pub fn more_thuente() -> MoreThuenteLS {
    MoreThuenteLS::new()
}

/// Hager–Zhang line search with Argmin's defaults.
pub fn hager_zhang() -> HagerZhangLS {
    HagerZhangLS::new()
}

/// Fletcher–Reeves conjugate gradient over `linesearch`.
pub fn build_fletcher_reeves<L>(linesearch: L, dim: usize) -> FletcherReevesCG<L> {
    NonlinearConjugateGradient::new(linesearch, FletcherReeves::new())
        .restart_iters(dim.max(1) as u64)
        .restart_orthogonality(CG_RESTART_ORTHOGONALITY)
}

/// Polak–Ribière conjugate gradient over `linesearch`.
pub fn build_polak_ribiere<L>(linesearch: L, dim: usize) -> PolakRibiereCG<L> {
    NonlinearConjugateGradient::new(linesearch, PolakRibiere::new())
        .restart_iters(dim.max(1) as u64)
        .restart_orthogonality(CG_RESTART_ORTHOGONALITY)
}

/// BFGS over `linesearch` with its gradient tolerance set to
/// `opts.tolerance`.
///
/// # Errors
/// - `OptError` when Argmin rejects the tolerance.
pub fn build_bfgs<L>(linesearch: L, opts: &MLEOptions) -> OptResult<Bfgs<L>> {
    Ok(BFGS::new(linesearch).with_tolerance_grad(opts.tolerance)?)
}

/// Starting state for conjugate gradient.
pub fn gradient_state(theta0: Theta) -> IterState<Theta, Grad, (), (), (), Cost> {
    IterState::new().param(theta0)
}

/// Starting state for BFGS: `theta0` with an identity inverse Hessian.
pub fn bfgs_state(theta0: Theta) -> IterState<Theta, Grad, (), Hessian, (), Cost> {
    let dim = theta0.len();
    IterState::new().param(theta0).inv_hessian(Hessian::eye(dim))
}
