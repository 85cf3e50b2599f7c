//! High-level entry points for maximizing a user-provided `LogLikelihood`.
//!
//! [`maximize`] validates the configuration, resolves the parameter
//! dimension and starting point, wraps the model in an `ArgMinAdapter`
//! (which *minimizes* the penalized `-ℓ(θ)`), dispatches to the back end the
//! [`Method`] selects, and packages the result as an [`OptimOutcome`] with
//! information criteria and, on request, the covariance table.
use crate::{
    inference::{InfoCriteria, estimate_covariance},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Algorithm, LineSearcher, LogLikelihood, MLEOptions, Method, OptimOutcome, Theta,
            adapter::ArgMinAdapter,
            annealing::Annealing,
            builders::{
                bfgs_state, build_bfgs, build_fletcher_reeves, build_polak_ribiere, build_simplex,
                gradient_state, hager_zhang, more_thuente, more_thuente_for_cg,
            },
            cycle::maximize_cycling,
            run::{RunSummary, run_derivative_free, run_gradient},
            trace::PathTrace,
            types::{ANNEALING_START, GRADIENT_START, SIMPLEX_START},
            validation::{validate_theta, validate_theta_hat},
        },
    },
};
use argmin::core::{IterState, State};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Maximize a log-likelihood `ℓ(θ)` with the method configured in `opts`.
///
/// # Behavior
/// - Validates `opts` and resolves the model dimension once
///   ([`ParamDim::FromData`] becomes the dataset's column count).
/// - Uses `opts.starting_point`, or a per-method default fill (simplex
///   `0.0`, gradient methods `0.1`, annealing `1.0`).
/// - Calls `f.check(theta0, data)` once before searching.
/// - Runs the back end; a failing step ends the search early with
///   [`SearchStatus::Stopped`] and the best point so far.
/// - Re-evaluates `ℓ` at the best point, computes [`InfoCriteria`], and, if
///   `opts.want_covariance`, attaches the covariance result.
///
/// Simulated annealing draws from a `StdRng` seeded with
/// `opts.anneal.seed`; use [`maximize_with_rng`] to supply your own.
///
/// # Errors
/// - Invalid options, a zero dimension, or a starting point of the wrong
///   length.
/// - Any error from `f.check` or from the evaluation at the starting point.
/// - A best point whose log-likelihood is not finite.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_mle::optimization::{
///     errors::OptResult,
///     loglik_optimizer::{LogLikelihood, MLEOptions, ParamDim, Theta, maximize},
/// };
///
/// struct Parabola;
/// impl LogLikelihood for Parabola {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-(theta[0] - 3.0).powi(2))
///     }
///     fn dim(&self) -> ParamDim {
///         ParamDim::Fixed(1)
///     }
/// }
///
/// let opts = MLEOptions { starting_point: Some(array![10.0]), ..MLEOptions::default() };
/// let out = maximize(&Parabola, &(), &opts)?;
/// println!("θ̂ = {:?}, ℓ(θ̂) = {}", out.theta_hat, out.value);
/// # Ok::<(), rust_mle::optimization::errors::OptError>(())
/// ```
///
/// [`ParamDim::FromData`]: crate::optimization::loglik_optimizer::ParamDim::FromData
/// [`SearchStatus::Stopped`]: crate::optimization::loglik_optimizer::SearchStatus::Stopped
pub fn maximize<F: LogLikelihood>(
    f: &F, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    let mut rng = StdRng::seed_from_u64(opts.anneal.seed);
    maximize_with_rng(f, data, opts, &mut rng)
}

/// [`maximize`] with an explicit random number generator for annealing.
pub fn maximize_with_rng<F, R>(
    f: &F, data: &F::Data, opts: &MLEOptions, rng: &mut R,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    R: Rng + ?Sized,
{
    opts.validate()?;
    if opts.cycle_tolerance.is_some() {
        return maximize_cycling(f, data, opts, rng);
    }
    maximize_single(f, data, opts, rng)
}

/// One search over every coordinate at once, ignoring `cycle_tolerance`.
///
/// `opts` must already be validated.
pub(crate) fn maximize_single<F, R>(
    f: &F, data: &F::Data, opts: &MLEOptions, rng: &mut R,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    R: Rng + ?Sized,
{
    let dim = f.dim().resolve(data)?;
    let theta0 = starting_point(opts, dim)?;
    f.check(&theta0, data)?;
    let trace = opts.trace_path.then(PathTrace::new);
    let problem = ArgMinAdapter::new(f, data, dim, opts.delta)
        .with_numerical_gradient(opts.method.force_numerical_gradient)
        .with_trace(trace.as_ref());

    let summary = dispatch(problem, theta0, opts, rng)?;
    let mut outcome = finish(f, data, dim, opts, summary)?;
    outcome.path = trace.map(|t| t.into_path(dim));
    Ok(outcome)
}

/// The configured starting point, or the method's default fill.
///
/// # Errors
/// - `OptError::ThetaLengthMismatch` when the configured point does not have
///   `dim` entries.
pub fn starting_point(opts: &MLEOptions, dim: usize) -> OptResult<Theta> {
    match &opts.starting_point {
        Some(start) => {
            validate_theta(start, dim)?;
            Ok(start.clone())
        }
        None => Ok(Theta::from_elem(dim, default_fill(opts.method))),
    }
}

// ---- Helper methods ----

fn default_fill(method: Method) -> f64 {
    match method.algorithm {
        Algorithm::NelderMead => SIMPLEX_START,
        Algorithm::Annealing => ANNEALING_START,
        Algorithm::FletcherReeves | Algorithm::Bfgs | Algorithm::PolakRibiere => GRADIENT_START,
    }
}

/// Build the configured back end and run it from `theta0`.
fn dispatch<'a, F, R>(
    problem: ArgMinAdapter<'a, F>, theta0: Theta, opts: &MLEOptions, rng: &mut R,
) -> OptResult<RunSummary>
where
    F: LogLikelihood,
    R: Rng + ?Sized,
{
    let dim = theta0.len();
    match (opts.method.algorithm, opts.line_searcher) {
        (Algorithm::NelderMead, _) => {
            let solver = build_simplex(&theta0, opts);
            let state = IterState::new().param(theta0).max_iters(opts.max_iter as u64);
            run_derivative_free(problem, solver, state, opts)
        }
        (Algorithm::Annealing, _) => {
            // The cooling schedule bounds the run; `max_iter` does not apply.
            let solver = Annealing::new(opts.anneal, opts.step_size, rng);
            run_derivative_free(problem, solver, IterState::new().param(theta0), opts)
        }
        (Algorithm::FletcherReeves, LineSearcher::MoreThuente) => {
            let solver = build_fletcher_reeves(more_thuente_for_cg()?, dim);
            run_gradient(problem, solver, gradient_state(theta0), opts)
        }
        (Algorithm::FletcherReeves, LineSearcher::HagerZhang) => {
            let solver = build_fletcher_reeves(hager_zhang(), dim);
            run_gradient(problem, solver, gradient_state(theta0), opts)
        }
        (Algorithm::PolakRibiere, LineSearcher::MoreThuente) => {
            let solver = build_polak_ribiere(more_thuente_for_cg()?, dim);
            run_gradient(problem, solver, gradient_state(theta0), opts)
        }
        (Algorithm::PolakRibiere, LineSearcher::HagerZhang) => {
            let solver = build_polak_ribiere(hager_zhang(), dim);
            run_gradient(problem, solver, gradient_state(theta0), opts)
        }
        (Algorithm::Bfgs, LineSearcher::MoreThuente) => {
            let solver = build_bfgs(more_thuente(), opts)?;
            run_gradient(problem, solver, bfgs_state(theta0), opts)
        }
        (Algorithm::Bfgs, LineSearcher::HagerZhang) => {
            let solver = build_bfgs(hager_zhang(), opts)?;
            run_gradient(problem, solver, bfgs_state(theta0), opts)
        }
    }
}

/// Package a finished search as an [`OptimOutcome`].
///
/// The reported value is `ℓ(θ̂)`; when `θ̂` sits marginally outside the
/// feasible region (a penalized search may stop just past the boundary) it
/// is the log-likelihood at the constraint's corrected point.
pub(crate) fn finish<F: LogLikelihood>(
    f: &F, data: &F::Data, dim: usize, opts: &MLEOptions, summary: RunSummary,
) -> OptResult<OptimOutcome> {
    let theta_hat = validate_theta_hat(summary.theta_hat)?;
    let value = match f.constraint(&theta_hat, data)? {
        Some(p) => f.value(&p.corrected, data)?,
        None => f.value(&theta_hat, data)?,
    };
    let info = InfoCriteria::for_data(value, dim, data);
    let mut outcome = OptimOutcome::new(
        Some(theta_hat),
        value,
        summary.status,
        summary.iterations,
        summary.fn_evals,
        summary.grad_norm,
        info,
        opts.clone(),
    )?;
    if opts.want_covariance {
        outcome.covariance =
            Some(estimate_covariance(f, data, &outcome.theta_hat, opts.delta));
    }
    Ok(outcome)
}
