//! inference::covariance — Hessian-based covariance and parameter tests.
//!
//! Purpose
//! -------
//! Turn a maximum-likelihood estimate into a table of uncertainty measures.
//! The observed information is the negated numerical Hessian of the
//! log-likelihood at `θ̂`; its inverse estimates the covariance of `θ̂`.
//!
//! Key behaviors
//! -------------
//! - Differentiate the *unpenalized* log-likelihood twice with
//!   [`numerical_hessian`] (the penalty shell plays no role here).
//! - Copy the information matrix into a `nalgebra::DMatrix` and invert it
//!   with `try_inverse`; failure yields
//!   [`InferenceError::SingularInformation`].
//! - For each parameter report estimate, variance, standard error,
//!   `t = estimate / se`, and one- and two-tailed p-values against a
//!   Student's t with `df = max(1, n_obs − k)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ̂` has the model's resolved dimension `k`.
//! - The log-likelihood is finite on a `2δ` neighborhood of `θ̂`; otherwise
//!   the Hessian fails validation and the error is returned.
//!
//! Conventions
//! -----------
//! - The Hessian is on the scale of the log-likelihood as the model reports
//!   it (a sum over observations for typical models).
//! - A non-positive variance (an indefinite information matrix) yields `NaN`
//!   standard error, t statistic and p-values for that parameter rather than
//!   an error.
//!
//! Testing notes
//! -------------
//! - Unit tests use quadratic log-likelihoods whose covariance is known in
//!   closed form, and a flat direction for the singular path.
use crate::{
    data::Dataset,
    inference::errors::{InferenceError, InferenceResult},
    optimization::loglik_optimizer::{
        LogLikelihood, Theta, finite_diff::numerical_hessian, types::Hessian,
        validation::validate_theta,
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Estimates and their sampling uncertainty.
///
/// All vectors have one entry per parameter, in `θ` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    pub estimate: Array1<f64>,
    pub variance: Array1<f64>,
    pub std_err: Array1<f64>,
    pub t_stat: Array1<f64>,
    pub df: f64,
    pub p_one_tailed: Array1<f64>,
    pub p_two_tailed: Array1<f64>,
    /// Full `k × k` covariance matrix (inverse information).
    pub covariance: Array2<f64>,
}

/// Estimate the covariance of `theta_hat` from the numerical Hessian of
/// `f`'s log-likelihood.
///
/// Parameters
/// ----------
/// - `f`, `data`: the model and the data it was fitted on.
/// - `theta_hat`: the estimate.
/// - `delta`: differencing step for the Hessian.
///
/// Errors
/// ------
/// - `InferenceError::Opt` for dimension problems or a non-finite Hessian.
/// - `InferenceError::SingularInformation` when the information matrix is not
///   invertible.
/// - `InferenceError::InvalidReference` if the t distribution cannot be built.
pub fn estimate_covariance<F: LogLikelihood>(
    f: &F, data: &F::Data, theta_hat: &Theta, delta: f64,
) -> InferenceResult<ParameterTable> {
    let dim = f.dim().resolve(data)?;
    validate_theta(theta_hat, dim)?;
    let hessian = numerical_hessian(&|theta: &Theta| f.value(theta, data), theta_hat, delta)?;
    table_from_hessian(&hessian, theta_hat, data.n_obs())
}

/// Build the parameter table from a log-likelihood Hessian at `theta_hat`.
///
/// Errors
/// ------
/// - `InferenceError::SingularInformation` when `-hessian` is not invertible.
/// - `InferenceError::InvalidReference` if the t distribution cannot be built.
pub fn table_from_hessian(
    hessian: &Hessian, theta_hat: &Theta, n_obs: usize,
) -> InferenceResult<ParameterTable> {
    let k = theta_hat.len();
    let covariance = invert_information(hessian)?;
    let variance = covariance.diag().to_owned();
    let std_err = variance.mapv(|v| if v > 0.0 { v.sqrt() } else { f64::NAN });
    let t_stat = theta_hat / &std_err;

    let df = n_obs.saturating_sub(k).max(1) as f64;
    let reference = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| InferenceError::InvalidReference { df, reason: e.to_string() })?;
    let p_one_tailed =
        t_stat.mapv(|t| if t.is_nan() { f64::NAN } else { 1.0 - reference.cdf(t.abs()) });
    let p_two_tailed = p_one_tailed.mapv(|p| 2.0 * p);

    Ok(ParameterTable {
        estimate: theta_hat.clone(),
        variance,
        std_err,
        t_stat,
        df,
        p_one_tailed,
        p_two_tailed,
        covariance,
    })
}

// ---- Helper methods ----

/// Invert the information matrix `-hessian`.
fn invert_information(hessian: &Hessian) -> InferenceResult<Array2<f64>> {
    let k = hessian.nrows();
    let information = DMatrix::from_fn(k, k, |i, j| -hessian[[i, j]]);
    let inverse = information
        .try_inverse()
        .filter(|inv| inv.iter().all(|v| v.is_finite()))
        .ok_or(InferenceError::SingularInformation { dim: k })?;
    Ok(Array2::from_shape_fn((k, k), |(i, j)| inverse[(i, j)]))
}
