//! Restart a finished search with another method and keep the better fit.
//!
//! A restart copies the prior run's options, swaps in a new [`Method`],
//! scales `tolerance` and `step_size` by a common factor, and re-runs the
//! whole pipeline from either the prior estimate or the prior starting
//! point. Exactly one of the two outcomes is returned: the new one only if
//! its estimate is bounded and its log-likelihood is strictly higher. The
//! returned log-likelihood therefore never decreases.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        LogLikelihood, MLEOptions, Method, OptimOutcome, Theta, api::maximize_with_rng,
        types::RESTART_BOUND, validation::verify_scale,
    },
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::str::FromStr;

/// Where the restarted search begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartFrom {
    /// The prior `theta_hat`, when bounded; otherwise the prior start.
    #[default]
    PriorEstimate,
    /// The prior run's configured starting point (or its method default).
    PriorStart,
}

impl FromStr for StartFrom {
    type Err = String;

    /// Accepts `"estimate"`/`"ep"` and `"start"`/`"es"` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "estimate" | "ep" => Ok(StartFrom::PriorEstimate),
            "start" | "es" => Ok(StartFrom::PriorStart),
            other => Err(format!("unknown restart start '{other}'")),
        }
    }
}

/// Re-run `f` with `method`, starting from the prior estimate, and keep the
/// better of the two outcomes.
///
/// Annealing draws from a `StdRng` seeded with the prior options' seed.
///
/// # Errors
/// - [`OptError::InvalidScale`] when `scale` is non-finite or not positive,
///   or when the scaled tolerance/step size is invalid.
///
/// A failure of the restarted search itself is not an error: the prior
/// outcome is returned unchanged.
///
/// [`OptError::InvalidScale`]: crate::optimization::errors::OptError::InvalidScale
pub fn restart<F: LogLikelihood>(
    f: &F, data: &F::Data, prior: OptimOutcome, method: Method, scale: f64,
) -> OptResult<OptimOutcome> {
    let mut rng = StdRng::seed_from_u64(prior.options.anneal.seed);
    restart_with_rng(f, data, prior, method, scale, StartFrom::default(), &mut rng)
}

/// [`restart`] with an explicit start policy and random number generator.
pub fn restart_with_rng<F, R>(
    f: &F, data: &F::Data, prior: OptimOutcome, method: Method, scale: f64,
    start_from: StartFrom, rng: &mut R,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    R: Rng + ?Sized,
{
    let opts = derived_options(&prior, method, scale, start_from)?;
    let candidate = match maximize_with_rng(f, data, &opts, rng) {
        Ok(candidate) => candidate,
        Err(_) => return Ok(prior),
    };
    if is_bounded(&candidate.theta_hat) && candidate.value > prior.value {
        Ok(candidate)
    } else {
        Ok(prior)
    }
}

/// Finite with every entry below [`RESTART_BOUND`] in magnitude.
pub fn is_bounded(theta: &Theta) -> bool {
    theta.iter().all(|x| x.is_finite() && x.abs() < RESTART_BOUND)
}

// ---- Helper methods ----

/// Copy the prior options with the new method, scaled tolerance and step
/// size, and the chosen starting point.
fn derived_options(
    prior: &OptimOutcome, method: Method, scale: f64, start_from: StartFrom,
) -> OptResult<MLEOptions> {
    verify_scale(scale)?;
    let base = &prior.options;
    let starting_point = match start_from {
        StartFrom::PriorEstimate if is_bounded(&prior.theta_hat) => Some(prior.theta_hat.clone()),
        _ => base.starting_point.clone(),
    };
    let opts = MLEOptions {
        method,
        starting_point,
        tolerance: base.tolerance * scale,
        step_size: base.step_size * scale,
        ..base.clone()
    };
    opts.validate()?;
    Ok(opts)
}
