//! Execution helpers that step an `argmin` solver on a log-likelihood problem
//! and return a crate-friendly [`RunSummary`].
//!
//! Every back end goes through the same state machine:
//!
//! ```text
//! INITIALIZED ──step──▶ ITERATING ──converged──▶ CONVERGED
//!                          │  ╰──iteration cap──▶ ITERATION_LIMIT
//!                          ╰──step error───────▶ STOPPED (last good state)
//! ```
//!
//! We step `Solver::next_iter` ourselves rather than going through
//! `argmin::core::Executor` so that a failing step (line-search breakdown,
//! a model error at a trial point) ends the search with the best point found
//! so far instead of discarding it.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, LogLikelihood, MLEOptions, SearchStatus, Theta,
        adapter::ArgMinAdapter, types::STALL_ITERS,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::{
    core::{
        Error, IterState, KV, Problem, Solver, State, TerminationReason, TerminationStatus,
        observers::Observe,
    },
    kv,
};
use argmin_math::ArgminL2Norm;
#[cfg(feature = "obs_slog")]
use argmin_observer_slog::SlogLogger;
use std::collections::VecDeque;

/// Final solver state together with how the search ended.
#[derive(Debug, Clone)]
pub struct Finished<I> {
    pub state: I,
    pub status: SearchStatus,
}

/// Back-end independent summary of a finished search.
///
/// - `theta_hat`: best parameter vector seen (by penalized cost).
/// - `status`: how the search ended.
/// - `iterations`: completed back-end iterations.
/// - `fn_evals`: argmin evaluation counters (`cost_count`, `gradient_count`,
///   and `constraint_count` for annealing).
/// - `grad_norm`: L2 norm of the last cost gradient, for gradient back ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub theta_hat: Option<Theta>,
    pub status: SearchStatus,
    pub iterations: u64,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

/// Step `solver` on `op` from `state` until it converges, hits the iteration
/// cap stored in `state`, or fails.
///
/// # Behavior
/// - `Solver::init` runs first; an error there is returned as `Err` since no
///   valid point exists yet.
/// - After every step the evaluation counters, best point and iteration
///   counter are updated, the observer (if any) is notified, and
///   `converged(&state)` is checked before the solver's own termination
///   rules.
/// - A step that returns an error restores the state from before the step
///   and reports [`SearchStatus::Stopped`].
///
/// # Errors
/// - Errors from `Solver::init`.
/// - Observer failures.
pub fn drive<O, S, I>(
    op: O, mut solver: S, state: I, mut converged: impl FnMut(&I) -> bool,
    mut observer: Option<Box<dyn Observe<I>>>,
) -> OptResult<Finished<I>>
where
    S: Solver<O, I>,
    I: State + Clone,
{
    let mut problem = Problem::new(op);
    let (mut state, kv) = solver.init(&mut problem, state)?;
    state.func_counts(&problem);
    state.update();
    if let Some(obs) = observer.as_mut() {
        obs.observe_init(S::NAME, &state, &kv.unwrap_or_else(KV::new))?;
    }
    if converged(&state) {
        return Ok(Finished { state, status: SearchStatus::Converged });
    }

    loop {
        match solver.terminate_internal(&state) {
            TerminationStatus::NotTerminated => {}
            TerminationStatus::Terminated(reason) => {
                let status = status_from_reason(reason);
                return Ok(Finished { state, status });
            }
        }

        let snapshot = state.clone();
        let (mut next, kv) = match solver.next_iter(&mut problem, state) {
            Ok(stepped) => stepped,
            Err(err) => {
                let reason = OptError::from(err).to_string();
                return Ok(Finished { state: snapshot, status: SearchStatus::Stopped { reason } });
            }
        };
        next.func_counts(&problem);
        next.update();
        next.increment_iter();
        if let Some(obs) = observer.as_mut() {
            obs.observe_iter(&next, &kv.unwrap_or_else(KV::new))?;
        }
        state = next;

        if converged(&state) {
            return Ok(Finished { state, status: SearchStatus::Converged });
        }
    }
}

/// Run a gradient back end (conjugate gradient or BFGS).
///
/// Convergence: the ∞-norm of the current cost gradient is below
/// `opts.tolerance`, or the search has stalled: its best cost improved by
/// less than `opts.tolerance` over the last [`STALL_ITERS`] iterations (a
/// maximum on a constraint boundary, where the penalized cost has a kink and
/// the gradient never vanishes). `state` must already carry the starting
/// point (and, for BFGS, the initial inverse Hessian).
pub fn run_gradient<'a, F, S, H>(
    problem: ArgMinAdapter<'a, F>, solver: S, state: IterState<Theta, Grad, (), H, (), Cost>,
    opts: &MLEOptions,
) -> OptResult<RunSummary>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), H, (), Cost>>,
    H: Clone + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        if let Some(theta0) = state.get_param() {
            log_initial_state(theta0, &problem)?;
        }
    }
    let tol = opts.tolerance;
    let state = state.max_iters(opts.max_iter as u64);
    let mut stall = StallWatch::new(STALL_ITERS, tol);
    let converged = move |s: &IterState<Theta, Grad, (), H, (), Cost>| {
        let stalled = stall.observe(s.get_best_cost());
        stalled || s.get_gradient().is_some_and(|g| g.iter().all(|v| v.abs() < tol))
    };
    let logger = progress_logger(opts.verbose, describe_gradient_point::<H>);
    let Finished { state, status } = drive(problem, solver, state, converged, logger)?;
    let grad_norm = state.get_gradient().map(|g| g.l2_norm());
    Ok(summarize(state, status, grad_norm))
}

/// Run a derivative-free back end (simplex or annealing).
///
/// Convergence is left to the solver's own termination rule (simplex size
/// below `opts.tolerance`, or the annealing temperature below `t_min`). The
/// iteration cap is whatever `state` carries: the simplex gets
/// `opts.max_iter`, annealing is bounded by its schedule alone.
pub fn run_derivative_free<'a, F, S>(
    problem: ArgMinAdapter<'a, F>, solver: S, state: IterState<Theta, (), (), (), (), Cost>,
    opts: &MLEOptions,
) -> OptResult<RunSummary>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, (), (), (), (), Cost>>,
{
    let logger = progress_logger(opts.verbose, describe_point::<(), ()>);
    let Finished { state, status } = drive(problem, solver, state, |_| false, logger)?;
    Ok(summarize(state, status, None))
}

// ---- Helper Methods ----

fn summarize<G, H>(
    mut state: IterState<Theta, G, (), H, (), Cost>, status: SearchStatus, grad_norm: Option<f64>,
) -> RunSummary
where
    G: Clone,
    H: Clone,
{
    RunSummary {
        iterations: state.get_iter(),
        fn_evals: state.get_func_counts().clone(),
        theta_hat: state.take_best_param(),
        status,
        grad_norm,
    }
}

/// Map argmin's termination reasons onto [`SearchStatus`].
fn status_from_reason(reason: TerminationReason) -> SearchStatus {
    match reason {
        TerminationReason::MaxItersReached => SearchStatus::IterationLimit,
        TerminationReason::SolverExit(reason) => SearchStatus::Stopped { reason },
        _ => SearchStatus::Converged,
    }
}

/// Tracks the best cost over a sliding window of iterations.
#[derive(Debug, Clone)]
struct StallWatch {
    window: usize,
    tol: f64,
    history: VecDeque<Cost>,
}

impl StallWatch {
    fn new(window: usize, tol: f64) -> Self {
        Self { window, tol, history: VecDeque::with_capacity(window + 1) }
    }

    /// Record `best` and report whether it improved by less than `tol` over
    /// the last `window` observations.
    fn observe(&mut self, best: Cost) -> bool {
        self.history.push_back(best);
        if self.history.len() > self.window + 1 {
            self.history.pop_front();
        }
        self.history.len() == self.window + 1
            && self.history.front().is_some_and(|&first| first - best < self.tol)
    }
}

/// Observer wrapper that adds `describe(state)` to every record.
#[cfg_attr(not(feature = "obs_slog"), allow(dead_code))]
struct Annotated<I> {
    inner: Box<dyn Observe<I>>,
    describe: fn(&I) -> KV,
}

impl<I> Observe<I> for Annotated<I> {
    fn observe_init(&mut self, name: &str, state: &I, kv: &KV) -> Result<(), Error> {
        self.inner.observe_init(name, state, &kv.clone().merge((self.describe)(state)))
    }

    fn observe_iter(&mut self, state: &I, kv: &KV) -> Result<(), Error> {
        self.inner.observe_iter(state, &kv.clone().merge((self.describe)(state)))
    }
}

/// The current point.
fn describe_point<G, H>(state: &IterState<Theta, G, (), H, (), Cost>) -> KV {
    match state.get_param() {
        Some(theta) => kv!("theta" => format!("{theta}");),
        None => KV::new(),
    }
}

/// The current point and the L2 norm of its cost gradient.
fn describe_gradient_point<H>(state: &IterState<Theta, Grad, (), H, (), Cost>) -> KV {
    let kv = describe_point(state);
    match state.get_gradient() {
        Some(g) => kv.merge(kv!("grad_norm" => g.l2_norm();)),
        None => kv,
    }
}

#[cfg(feature = "obs_slog")]
fn progress_logger<I: 'static>(
    verbose: bool, describe: fn(&I) -> KV,
) -> Option<Box<dyn Observe<I>>>
where
    SlogLogger: Observe<I>,
{
    verbose.then(|| {
        let inner = Box::new(SlogLogger::term_noblock()) as Box<dyn Observe<I>>;
        Box::new(Annotated { inner, describe }) as Box<dyn Observe<I>>
    })
}

#[cfg(not(feature = "obs_slog"))]
fn progress_logger<I>(_verbose: bool, _describe: fn(&I) -> KV) -> Option<Box<dyn Observe<I>>> {
    None
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: ell(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
