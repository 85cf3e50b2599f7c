//! Adapter that exposes a user `LogLikelihood` as an `argmin` problem.
//!
//! We convert a *maximization* of a log-likelihood `ℓ(θ)` into a *minimization*
//! problem by defining the cost as `c(θ) = -ℓ(θ)`. Every evaluation passes
//! through the model's feasibility constraint first (the penalty shell):
//!
//! - feasible `θ`: `c(θ) = -ℓ(θ)`;
//! - infeasible `θ`: `c(θ) = -ℓ(θ') + p`, where the constraint reports the
//!   nearest feasible point `θ'` and a penalty `p > 0`.
//!
//! Because `p → 0` as `θ` approaches the boundary, the cost stays continuous
//! there and every back end sees an unconstrained surface. The log-likelihood
//! itself is only ever evaluated at feasible points.
//!
//! Analytic gradients (if provided by the user) are negated and used only
//! where the constraint is inactive; otherwise, or when the method forces it,
//! we difference the **cost** closure, so no sign flip is needed in that
//! branch.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        finite_diff::numerical_gradient,
        trace::PathTrace,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::{validate_grad, validate_penalty, validate_theta},
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns the penalized negative log-likelihood.
/// - `Gradient::gradient` returns:
///   - `-∇ℓ(θ)` if the user provides an analytic gradient, the constraint is
///     inactive at `θ`, and numerical gradients are not forced, or
///   - a central-difference gradient of the penalized cost.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
    pub dim: usize,
    pub delta: f64,
    pub force_numerical: bool,
    trace: Option<&'a PathTrace>,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `LogLikelihood` and its data.
    ///
    /// `dim` is the resolved parameter dimension and `delta` the differencing
    /// step used for numerical gradients.
    pub fn new(f: &'a F, data: &'a F::Data, dim: usize, delta: f64) -> Self {
        Self { f, data, dim, delta, force_numerical: false, trace: None }
    }

    pub fn with_numerical_gradient(mut self, force: bool) -> Self {
        self.force_numerical = force;
        self
    }

    /// Record every cost evaluation into `trace`.
    pub fn with_trace(mut self, trace: Option<&'a PathTrace>) -> Self {
        self.trace = trace;
        self
    }

    /// Evaluate the penalized cost at `theta`.
    ///
    /// - `ℓ = NaN` is an error; `ℓ = ±∞` yields cost `+∞` ("search elsewhere").
    ///
    /// # Errors
    /// - `OptError::ThetaLengthMismatch` for a vector of the wrong length.
    /// - `OptError::InvalidPenalty` / `OptError::PenaltyDimMismatch` for a
    ///   malformed constraint report.
    /// - `OptError::NonFiniteCost` when the log-likelihood is `NaN`.
    /// - Any error from the user's `constraint` or `value`.
    pub fn penalized_cost(&self, theta: &Theta) -> OptResult<Cost> {
        validate_theta(theta, self.dim)?;
        let (loglik, penalty) = match self.f.constraint(theta, self.data)? {
            Some(p) => {
                validate_penalty(&p, self.dim)?;
                (self.f.value(&p.corrected, self.data)?, p.penalty)
            }
            None => (self.f.value(theta, self.data)?, 0.0),
        };
        if loglik.is_nan() {
            return Err(OptError::NonFiniteCost { value: loglik });
        }
        if loglik.is_infinite() {
            return Ok(f64::INFINITY);
        }
        Ok(-loglik + penalty)
    }

    /// Evaluate the unpenalized log-likelihood `ℓ(θ)`.
    pub fn loglik(&self, theta: &Theta) -> OptResult<f64> {
        validate_theta(theta, self.dim)?;
        self.f.value(theta, self.data)
    }

    /// Whether `theta` lies inside the model's feasible region.
    pub fn is_feasible(&self, theta: &Theta) -> OptResult<bool> {
        Ok(self.f.constraint(theta, self.data)?.is_none())
    }

    /// Gradient of the penalized cost, in `OptError` space.
    pub fn cost_gradient(&self, theta: &Theta) -> OptResult<Grad> {
        if !self.force_numerical && self.is_feasible(theta)? {
            match self.f.grad(theta, self.data) {
                Ok(g) => {
                    validate_grad(&g, self.dim)?;
                    return Ok(-g);
                }
                Err(OptError::GradientNotImplemented) => {}
                Err(e) => return Err(e),
            }
        }
        numerical_gradient(&|t: &Theta| self.penalized_cost(t), theta, self.delta)
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost and, when tracing, record `(θ, -cost)`.
    ///
    /// # Errors
    /// Propagates any `OptError` from [`ArgMinAdapter::penalized_cost`].
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let cost = self.penalized_cost(theta)?;
        if let Some(trace) = self.trace {
            trace.record(theta, cost);
        }
        Ok(cost)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// # Errors
    /// - Propagates user errors from `grad` (other than
    ///   `GradientNotImplemented`).
    /// - Propagates any error raised by cost evaluations while differencing.
    /// - Returns validation errors if the gradient has wrong dimension or
    ///   non-finite entries.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.cost_gradient(theta)?)
    }
}
