//! loglik_optimizer::annealing — simulated annealing as an argmin solver.
//!
//! Purpose
//! -------
//! Provide a stochastic back end for likelihoods with several local optima.
//! The walker proposes random moves whose Manhattan length is bounded by the
//! step size, always accepts improvements, and accepts worse points with the
//! Boltzmann probability `exp(−ΔE / (k T))`. The temperature falls
//! geometrically, so early levels roam and late levels fine-tune.
//!
//! Key behaviors
//! -------------
//! - Energy is the penalized cost of the adapter (`-ℓ(θ)` plus penalty).
//! - Each argmin iteration is one temperature level: `iters_fixed_t`
//!   Metropolis moves at temperature `T`, then `T ← T / mu_t`. The solver
//!   reports convergence once `T < t_min`.
//! - The best point ever visited is tracked and returned, not the final
//!   walker position.
//! - Proposals are rejected (and redrawn from the same origin, up to
//!   `n_tries` times) when they fall outside the model's feasible region; if
//!   every attempt is infeasible the walker stays put.
//!
//! Invariants & assumptions
//! ------------------------
//! - The walker is always feasible: an infeasible start is first replaced by
//!   the constraint's corrected point.
//! - [`propose_step`] moves at most `step_size` in L1 distance.
//! - All randomness comes from the RNG owned by the solver; a seeded RNG
//!   reproduces a run exactly.
//!
//! Conventions
//! -----------
//! - The initial temperature is `AnnealSchedule::t_initial` when given, else
//!   `|E(θ₀)|`; a zero or non-finite energy falls back to `1.0`.
//! - The run is bounded by the schedule alone (about
//!   `ln(T₀ / t_min) / ln(mu_t)` levels); `MLEOptions::max_iter` does not
//!   apply.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        AnnealSchedule, Cost, LogLikelihood, Theta, adapter::ArgMinAdapter,
        validation::validate_penalty,
    },
};
use argmin::{
    core::{
        ArgminError, CostFunction, Error, IterState, KV, Problem, Solver, TerminationReason,
        TerminationStatus,
    },
    kv,
};
use rand::{Rng, seq::SliceRandom};

/// Feasibility queries the annealing walker needs from its problem.
pub trait Feasibility {
    /// `None` when `theta` is feasible, else the nearest feasible point.
    fn correction(&self, theta: &Theta) -> OptResult<Option<Theta>>;
}

impl<F: LogLikelihood> Feasibility for ArgMinAdapter<'_, F> {
    fn correction(&self, theta: &Theta) -> OptResult<Option<Theta>> {
        match self.f.constraint(theta, self.data)? {
            Some(p) => {
                validate_penalty(&p, self.dim)?;
                Ok(Some(p.corrected))
            }
            None => Ok(None),
        }
    }
}

/// Manhattan (L1) distance between two points of equal length.
pub fn manhattan(a: &Theta, b: &Theta) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Draw one unconstrained move from `from` with L1 length at most `step_size`.
///
/// Dimensions are visited in random order. Each one moves by a uniform
/// fraction of the budget still remaining, in a random direction, and the
/// budget shrinks by what was spent.
pub fn propose_step<R: Rng + ?Sized>(from: &Theta, step_size: f64, rng: &mut R) -> Theta {
    let mut to = from.clone();
    let mut order: Vec<usize> = (0..from.len()).collect();
    order.shuffle(rng);
    let mut remaining = step_size;
    for i in order {
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let amount = rng.gen_range(0.0..1.0) * remaining;
        to[i] += sign * amount;
        remaining -= amount;
    }
    to
}

/// Simulated-annealing solver over a penalized cost with feasibility checks.
#[derive(Debug, Clone)]
pub struct Annealing<R> {
    schedule: AnnealSchedule,
    step_size: f64,
    rng: R,
    temperature: f64,
    current: Option<(Theta, Cost)>,
    best: Option<(Theta, Cost)>,
}

impl<R: Rng> Annealing<R> {
    pub fn new(schedule: AnnealSchedule, step_size: f64, rng: R) -> Self {
        Self { schedule, step_size, rng, temperature: 0.0, current: None, best: None }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// One feasible move from `from`, or `from` itself after `n_tries`
    /// infeasible proposals.
    fn feasible_step<O: Feasibility>(
        &mut self, problem: &mut Problem<O>, from: &Theta,
    ) -> Result<Theta, Error> {
        for _ in 0..self.schedule.n_tries {
            let candidate = propose_step(from, self.step_size, &mut self.rng);
            let correction =
                problem.problem("constraint_count", |op| Ok(op.correction(&candidate)?))?;
            if correction.is_none() {
                return Ok(candidate);
            }
        }
        Ok(from.clone())
    }

    /// Metropolis acceptance of energy `next` against `current` at the
    /// present temperature.
    fn accept(&mut self, current: Cost, next: Cost) -> bool {
        if next < current {
            return true;
        }
        let threshold = (-(next - current) / (self.schedule.k * self.temperature)).exp();
        self.rng.gen_range(0.0..1.0) < threshold
    }
}

impl<O, R> Solver<O, IterState<Theta, (), (), (), (), Cost>> for Annealing<R>
where
    O: CostFunction<Param = Theta, Output = Cost> + Feasibility,
    R: Rng,
{
    const NAME: &'static str = "Simulated Annealing";

    fn init(
        &mut self, problem: &mut Problem<O>, mut state: IterState<Theta, (), (), (), (), Cost>,
    ) -> Result<(IterState<Theta, (), (), (), (), Cost>, Option<KV>), Error> {
        let theta0 = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "Simulated annealing requires an initial parameter vector".to_string(),
        })?;
        let start = problem
            .problem("constraint_count", |op| Ok(op.correction(&theta0)?))?
            .unwrap_or(theta0);
        let energy = problem.cost(&start)?;

        let t0 = self.schedule.t_initial.unwrap_or(energy.abs());
        self.temperature = if t0.is_finite() && t0 > 0.0 { t0 } else { 1.0 };
        self.current = Some((start.clone(), energy));
        self.best = Some((start.clone(), energy));
        Ok((state.param(start).cost(energy), Some(kv!("temperature" => self.temperature;))))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: IterState<Theta, (), (), (), (), Cost>,
    ) -> Result<(IterState<Theta, (), (), (), (), Cost>, Option<KV>), Error> {
        let (mut theta, mut energy) = self.current.take().ok_or_else(|| {
            ArgminError::NotInitialized { text: "Annealing walker was not initialized".to_string() }
        })?;
        let (mut best_theta, mut best_energy) =
            self.best.take().unwrap_or_else(|| (theta.clone(), energy));
        let level_start = theta.clone();
        let mut accepted = 0usize;

        for _ in 0..self.schedule.iters_fixed_t {
            let candidate = self.feasible_step(problem, &theta)?;
            let candidate_energy = problem.cost(&candidate)?;
            if self.accept(energy, candidate_energy) {
                theta = candidate;
                energy = candidate_energy;
                accepted += 1;
                if energy < best_energy {
                    best_theta = theta.clone();
                    best_energy = energy;
                }
            }
        }

        let level_temperature = self.temperature;
        self.temperature /= self.schedule.mu_t;
        let moved = manhattan(&level_start, &theta);
        let acceptance = accepted as f64 / self.schedule.iters_fixed_t as f64;
        self.current = Some((theta, energy));
        self.best = Some((best_theta.clone(), best_energy));

        Ok((
            state.param(best_theta).cost(best_energy),
            Some(kv!(
                "temperature" => level_temperature;
                "acceptance" => acceptance;
                "moved" => moved;
            )),
        ))
    }

    fn terminate(&mut self, _state: &IterState<Theta, (), (), (), (), Cost>) -> TerminationStatus {
        if self.temperature < self.schedule.t_min {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}
