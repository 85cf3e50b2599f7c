//! Validation helpers for log-likelihood optimization.
//!
//! This module centralizes common consistency checks used across the
//! search engine:
//!
//! - **Option checks**: [`verify_tolerance`], [`verify_step_size`],
//!   [`verify_delta`], [`verify_max_iter`], [`verify_scale`] and
//!   [`verify_schedule`] ensure numeric settings are finite and in range.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Constraint output**: [`validate_penalty`] checks what a model's
//!   feasibility constraint reports.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values; [`validate_theta`]
//!   checks a vector against the resolved dimension.
//! - **Objective values**: [`validate_value`] checks log-likelihood outputs
//!   for finiteness.
//! - **Hessians**: [`validate_hessian`] checks shape and finiteness.
//!
//! These helpers standardize error reporting by returning domain-specific
//! [`OptError`] variants, making higher-level code more uniform and easier
//! to debug.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{AnnealSchedule, Grad, Penalty, Theta, types::Hessian},
};

fn positive_finite(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() {
        return Err("Value must be finite.");
    }
    if value <= 0.0 {
        return Err("Value must be positive.");
    }
    Ok(())
}

/// Validate the stopping tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolerance`] if the value is non-finite or ≤ 0.0.
pub fn verify_tolerance(tol: f64) -> OptResult<()> {
    positive_finite(tol).map_err(|reason| OptError::InvalidTolerance { tol, reason })
}

/// Validate the simplex edge / annealing step budget.
///
/// # Errors
/// Returns [`OptError::InvalidStepSize`] if the value is non-finite or ≤ 0.0.
pub fn verify_step_size(step: f64) -> OptResult<()> {
    positive_finite(step).map_err(|reason| OptError::InvalidStepSize { step, reason })
}

/// Validate the central-difference step.
///
/// # Errors
/// Returns [`OptError::InvalidDelta`] if the value is non-finite or ≤ 0.0.
pub fn verify_delta(delta: f64) -> OptResult<()> {
    positive_finite(delta).map_err(|reason| OptError::InvalidDelta { delta, reason })
}

/// Validate the iteration cap.
///
/// # Errors
/// Returns [`OptError::InvalidMaxIter`] if `max_iter == 0`.
pub fn verify_max_iter(max_iter: usize) -> OptResult<()> {
    if max_iter == 0 {
        return Err(OptError::InvalidMaxIter {
            max_iter,
            reason: "Maximum iterations must be positive.",
        });
    }
    Ok(())
}

/// Validate a restart scaling factor.
///
/// # Errors
/// Returns [`OptError::InvalidScale`] if the value is non-finite or ≤ 0.0.
pub fn verify_scale(scale: f64) -> OptResult<()> {
    positive_finite(scale).map_err(|reason| OptError::InvalidScale { scale, reason })
}

/// Validate an annealing cooling schedule.
///
/// Checks:
/// - `n_tries ≥ 1` and `iters_fixed_t ≥ 1`
/// - `k > 0`, `t_min > 0`, and `t_initial > 0` when given (all finite)
/// - `mu_t > 1`, so the temperature strictly decreases
///
/// # Errors
/// Returns [`OptError::InvalidSchedule`] naming the first offending field.
pub fn verify_schedule(schedule: &AnnealSchedule) -> OptResult<()> {
    let invalid = |field: &'static str, value: f64, reason: &'static str| {
        Err(OptError::InvalidSchedule { field, value, reason })
    };
    if schedule.n_tries == 0 {
        return invalid("n_tries", 0.0, "At least one try is required.");
    }
    if schedule.iters_fixed_t == 0 {
        return invalid("iters_fixed_t", 0.0, "At least one move per temperature is required.");
    }
    if let Err(reason) = positive_finite(schedule.k) {
        return invalid("k", schedule.k, reason);
    }
    if let Err(reason) = positive_finite(schedule.t_min) {
        return invalid("t_min", schedule.t_min, reason);
    }
    if let Some(t) = schedule.t_initial {
        if let Err(reason) = positive_finite(t) {
            return invalid("t_initial", t, reason);
        }
    }
    if !schedule.mu_t.is_finite() || schedule.mu_t <= 1.0 {
        return invalid("mu_t", schedule.mu_t, "Damping factor must be finite and > 1.");
    }
    Ok(())
}

/// Validate a parameter vector against the resolved model dimension.
///
/// # Errors
/// Returns [`OptError::ThetaLengthMismatch`] if `theta.len() != dim`.
pub fn validate_theta(theta: &Theta, dim: usize) -> OptResult<()> {
    if theta.len() != dim {
        return Err(OptError::ThetaLengthMismatch { expected: dim, actual: theta.len() });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate what a model's constraint reported for an infeasible point.
///
/// Checks:
/// - `penalty` is finite and strictly positive
/// - `corrected.len() == dim`
///
/// # Errors
/// - [`OptError::InvalidPenalty`] for a non-finite or non-positive penalty.
/// - [`OptError::PenaltyDimMismatch`] for a corrected point of the wrong length.
pub fn validate_penalty(penalty: &Penalty, dim: usize) -> OptResult<()> {
    if !penalty.penalty.is_finite() {
        return Err(OptError::InvalidPenalty {
            value: penalty.penalty,
            reason: "Penalty must be finite.",
        });
    }
    if penalty.penalty <= 0.0 {
        return Err(OptError::InvalidPenalty {
            value: penalty.penalty,
            reason: "A violated constraint must report a strictly positive penalty.",
        });
    }
    if penalty.corrected.len() != dim {
        return Err(OptError::PenaltyDimMismatch {
            expected: dim,
            found: penalty.corrected.len(),
        });
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// Accepts only a present vector with all **finite** entries.
///
/// # Returns
/// The owned `Theta` if valid.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar log-likelihood value is finite.
///
/// Negative values are fine as long as they are finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate the shape and entries of a Hessian matrix.
///
/// # Checks
/// 1. Matrix dimensions must equal `dim × dim`.
/// 2. All entries must be finite (no NaN or ±∞).
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] if dimensions do not match `dim`.
/// - [`OptError::InvalidHessian`] if any entry is non-finite, with offending
///   row/col indices and value.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Range checks on annealing schedules.
    // - Constraint-output validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A schedule whose damping factor does not cool is rejected.
    //
    // Given
    // -----
    // - The default schedule with `mu_t = 1.0`.
    //
    // Expect
    // ------
    // - `InvalidSchedule { field: "mu_t", .. }`; the default itself passes.
    fn verify_schedule_rejects_non_cooling_damping() {
        let ok = AnnealSchedule::default();
        let bad = AnnealSchedule { mu_t: 1.0, ..ok };

        assert!(verify_schedule(&ok).is_ok());
        assert!(matches!(
            verify_schedule(&bad),
            Err(OptError::InvalidSchedule { field: "mu_t", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A constraint may not report a zero penalty or a corrected point of the
    // wrong length.
    //
    // Given
    // -----
    // - Penalty 0.0 with a 2-vector; penalty 0.5 with a 3-vector; dim = 2.
    //
    // Expect
    // ------
    // - `InvalidPenalty`, then `PenaltyDimMismatch`.
    fn validate_penalty_rejects_zero_and_wrong_length() {
        let zero = Penalty::new(0.0, array![1.0, 1.0]);
        let long = Penalty::new(0.5, array![1.0, 1.0, 1.0]);

        assert!(matches!(validate_penalty(&zero, 2), Err(OptError::InvalidPenalty { .. })));
        assert!(matches!(
            validate_penalty(&long, 2),
            Err(OptError::PenaltyDimMismatch { expected: 2, found: 3 })
        ));
    }
}
