//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Approximate first and second derivatives of a scalar objective around a
//! parameter vector, with validation and symmetry cleanup, so the search
//! engine and the covariance estimator can request derivatives of any
//! [`LogLikelihood`] without an analytic gradient.
//!
//! Key behaviors
//! -------------
//! - [`numerical_gradient`]: central differences with step `δ` per
//!   coordinate, `(f(θ + δ eᵢ) − f(θ − δ eᵢ)) / 2δ`, falling back to the
//!   `finitediff` forward-difference gradient when the central estimate is
//!   not finite.
//! - [`numerical_hessian`]: row `k` is the central-difference gradient of the
//!   scalar map `θ ↦ ∂ₖf(θ)` (itself a central difference), so each entry is
//!   a difference of differences with the same `δ`. A non-finite result falls
//!   back to the `finitediff` gradient-free forward Hessian. The result is
//!   symmetrized in place.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives are fallible (`Fn(&Theta) -> OptResult<f64>`); the first
//!   error raised during differencing aborts the computation and is returned
//!   unchanged. On the `finitediff` fallback path, errors are routed through
//!   a `RefCell` slot because that API only accepts `f64`-valued closures.
//! - Gradients and Hessians returned from this module satisfy
//!   [`validate_grad`] and [`validate_hessian`].
//! - `δ > 0` is validated by the caller (see `MLEOptions::validate`).
//!
//! Conventions
//! -----------
//! - Differences are taken with respect to the raw parameter vector `Theta`.
//! - Central differences are preferred; forward differences are used only as
//!   a fallback when the central approximation fails validation.
//!
//! Downstream usage
//! ----------------
//! - The cost adapter calls [`numerical_gradient`] on the penalized cost when
//!   no analytic gradient applies.
//! - The covariance estimator calls [`numerical_hessian`] on the
//!   log-likelihood at the optimum.
//!
//! Testing notes
//! -------------
//! - Unit tests check exactness on quadratics, agreement with a closed-form
//!   gradient on a non-quadratic function, error propagation, and the
//!   non-finite paths.
//!
//! [`LogLikelihood`]: crate::optimization::loglik_optimizer::LogLikelihood
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Central-difference gradient of a fallible scalar objective.
///
/// Parameters
/// ----------
/// - `f`: objective `θ ↦ f(θ)`.
/// - `theta`: evaluation point; defines the gradient length.
/// - `delta`: differencing step.
///
/// Returns
/// -------
/// The raw central-difference vector. Entries may be non-finite when `f`
/// returns `±∞` near `theta`; use [`numerical_gradient`] for the validated
/// version.
///
/// Errors
/// ------
/// - The first error returned by `f`.
pub fn central_gradient<F>(f: &F, theta: &Theta, delta: f64) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let mut grad = Grad::zeros(theta.len());
    let mut shifted = theta.clone();
    for i in 0..theta.len() {
        let x = theta[i];
        shifted[i] = x + delta;
        let up = f(&shifted)?;
        shifted[i] = x - delta;
        let down = f(&shifted)?;
        shifted[i] = x;
        grad[i] = (up - down) / (2.0 * delta);
    }
    Ok(grad)
}

/// Validated numerical gradient.
///
/// Central differences first; if the result fails [`validate_grad`], retry
/// with the `finitediff` forward-difference gradient.
///
/// Errors
/// ------
/// - The first error returned by `f` on either path.
/// - `OptError::InvalidGradient` when the fallback is not finite either.
pub fn numerical_gradient<F>(f: &F, theta: &Theta, delta: f64) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let dim = theta.len();
    let central = central_gradient(f, theta, delta)?;
    if validate_grad(&central, dim).is_ok() {
        return Ok(central);
    }
    let slot = RefCell::new(None);
    let capturing = capture(f, &slot);
    let forward = theta.forward_diff(&capturing);
    if let Some(err) = slot.take() {
        return Err(err);
    }
    validate_grad(&forward, dim)?;
    Ok(forward)
}

/// Validated, symmetric numerical Hessian of a fallible scalar objective.
///
/// Parameters
/// ----------
/// - `f`: objective `θ ↦ f(θ)`.
/// - `theta`: evaluation point; the Hessian is `theta.len() × theta.len()`.
/// - `delta`: differencing step for both the inner and outer differences.
///
/// Errors
/// ------
/// - The first error returned by `f`.
/// - `OptError::InvalidHessian` when both the central and the fallback
///   forward Hessian contain non-finite entries.
///
/// Notes
/// -----
/// - The cost is `4 n²` evaluations of `f`.
/// - The central validation error is discarded; only the fallback result is
///   surfaced.
pub fn numerical_hessian<F>(f: &F, theta: &Theta, delta: f64) -> OptResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let dim = theta.len();
    let mut hess = Hessian::zeros((dim, dim));
    for k in 0..dim {
        let partial_k = |point: &Theta| -> OptResult<f64> {
            let mut shifted = point.clone();
            shifted[k] = point[k] + delta;
            let up = f(&shifted)?;
            shifted[k] = point[k] - delta;
            let down = f(&shifted)?;
            Ok((up - down) / (2.0 * delta))
        };
        let row = central_gradient(&partial_k, theta, delta)?;
        hess.row_mut(k).assign(&row);
    }
    if validate_hessian(&hess, dim).is_ok() {
        symmetrize_hess(&mut hess);
        return Ok(hess);
    }

    let slot = RefCell::new(None);
    let capturing = capture(f, &slot);
    let mut forward = theta.forward_hessian_nograd(&capturing);
    if let Some(err) = slot.take() {
        return Err(err);
    }
    validate_hessian(&forward, dim)?;
    symmetrize_hess(&mut forward);
    Ok(forward)
}

// ---- Helper methods ----

/// Wrap a fallible objective as the `f64`-valued closure `finitediff` wants.
///
/// The first error is stored in `slot`; that evaluation and every later one
/// return `NaN`.
fn capture<'a, F>(f: &'a F, slot: &'a RefCell<Option<OptError>>) -> impl Fn(&Theta) -> f64 + 'a
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    move |theta: &Theta| {
        if slot.borrow().is_some() {
            return f64::NAN;
        }
        match f(theta) {
            Ok(value) => value,
            Err(err) => {
                slot.replace(Some(err));
                f64::NAN
            }
        }
    }
}

/// Replace each off-diagonal pair with its average; the diagonal is unchanged.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
