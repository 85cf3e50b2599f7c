//! Coordinate cycling: maximize one parameter at a time.
//!
//! With `MLEOptions::cycle_tolerance` set, [`maximize_cycling`] runs the
//! configured method on each coordinate in turn (all others held fixed),
//! sweeping every coordinate, until the log-likelihood moves by less than
//! the tolerance between two sweeps. The sweep count is capped by
//! `max_iter`; hitting the cap reports [`SearchStatus::IterationLimit`].
//!
//! Each one-dimensional search sees the model through [`FixedCoordinates`],
//! so the usual penalty shell, gradient fallback and back ends apply
//! unchanged.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        FnEvalMap, Grad, LogLikelihood, MLEOptions, OptimOutcome, ParamDim, Penalty,
        SearchStatus, Theta,
        api::{finish, maximize_single, starting_point},
        run::RunSummary,
        trace::PathTrace,
        validation::{validate_grad, validate_penalty},
    },
};
use ndarray::array;
use rand::Rng;

/// One coordinate of `f`, with every other coordinate pinned to `base`.
#[derive(Debug, Clone)]
pub struct FixedCoordinates<'a, F> {
    pub f: &'a F,
    pub base: Theta,
    pub index: usize,
}

impl<'a, F: LogLikelihood> FixedCoordinates<'a, F> {
    pub fn new(f: &'a F, base: Theta, index: usize) -> Self {
        Self { f, base, index }
    }

    /// `base` with coordinate `index` replaced by `theta[0]`.
    fn full(&self, theta: &Theta) -> Theta {
        let mut full = self.base.clone();
        full[self.index] = theta[0];
        full
    }
}

impl<F: LogLikelihood> LogLikelihood for FixedCoordinates<'_, F> {
    type Data = F::Data;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        self.f.value(&self.full(theta), data)
    }

    fn dim(&self) -> ParamDim {
        ParamDim::Fixed(1)
    }

    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let grad = self.f.grad(&self.full(theta), data)?;
        validate_grad(&grad, self.base.len())?;
        Ok(array![grad[self.index]])
    }

    /// The full model's penalty, with the correction projected onto this
    /// coordinate.
    fn constraint(&self, theta: &Theta, data: &Self::Data) -> OptResult<Option<Penalty>> {
        match self.f.constraint(&self.full(theta), data)? {
            Some(p) => {
                validate_penalty(&p, self.base.len())?;
                Ok(Some(Penalty::new(p.penalty, array![p.corrected[self.index]])))
            }
            None => Ok(None),
        }
    }
}

/// Maximize `f` by cycling one-dimensional searches over its coordinates.
///
/// Called by [`maximize_with_rng`](super::maximize_with_rng) when
/// `opts.cycle_tolerance` is set; the inner searches run without covariance
/// or tracing.
/// The traced path (if requested) holds one point per coordinate update.
pub fn maximize_cycling<F, R>(
    f: &F, data: &F::Data, opts: &MLEOptions, rng: &mut R,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    R: Rng + ?Sized,
{
    let dim = f.dim().resolve(data)?;
    let tolerance = opts.cycle_tolerance.unwrap_or(opts.tolerance);
    let mut theta = starting_point(opts, dim)?;
    f.check(&theta, data)?;

    let inner = MLEOptions {
        cycle_tolerance: None,
        want_covariance: false,
        trace_path: false,
        ..opts.clone()
    };
    let trace = opts.trace_path.then(PathTrace::new);
    let mut fn_evals = FnEvalMap::new();
    let mut iterations = 0u64;
    let mut status = SearchStatus::IterationLimit;
    let mut previous = f64::NEG_INFINITY;

    for _ in 0..opts.max_iter {
        let mut current = previous;
        for index in 0..dim {
            let coordinate = FixedCoordinates::new(f, theta.clone(), index);
            let one = MLEOptions { starting_point: Some(array![theta[index]]), ..inner.clone() };
            let out = maximize_single(&coordinate, data, &one, rng)?;

            theta[index] = out.theta_hat[0];
            current = out.value;
            iterations += out.iterations as u64;
            for (name, count) in out.fn_evals {
                *fn_evals.entry(name).or_insert(0) += count;
            }
            if let Some(trace) = &trace {
                trace.record(&theta, -current);
            }
        }
        if (current - previous).abs() < tolerance {
            status = SearchStatus::Converged;
            break;
        }
        previous = current;
    }

    let summary =
        RunSummary { theta_hat: Some(theta), status, iterations, fn_evals, grad_norm: None };
    let mut outcome = finish(f, data, dim, opts, summary)?;
    outcome.path = trace.map(|t| t.into_path(dim));
    Ok(outcome)
}
