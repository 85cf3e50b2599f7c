//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model (required
//!   log-likelihood plus optional gradient, feasibility constraint and draw).
//! - [`Method`] / [`Algorithm`]: back-end selection, including the legacy
//!   integer method codes.
//! - [`MLEOptions`] and [`AnnealSchedule`]: configuration for a search.
//! - [`LineSearcher`]: choice of line search used by gradient back ends.
//! - [`OptimOutcome`] / [`SearchStatus`]: normalized result returned by the
//!   high-level `maximize` API.
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)` (plus a penalty outside the feasible region). If an analytic
//! gradient is provided, it should be the gradient of the log-likelihood
//! (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::{
    data::Dataset,
    inference::{InferenceResult, InfoCriteria, ParameterTable},
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            Cost, FnEvalMap, Grad, Theta,
            trace::SearchPath,
            types::{
                DEFAULT_DELTA, DEFAULT_MAX_ITER, DEFAULT_STEP_SIZE, DEFAULT_TOLERANCE,
            },
            validation::{
                validate_theta_hat, validate_value, verify_delta, verify_max_iter,
                verify_schedule, verify_step_size, verify_tolerance,
            },
        },
    },
};
use ndarray::Array1;
use rand::RngCore;
use std::{fmt, str::FromStr};

/// User-implemented log-likelihood interface (the model adapter).
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into every call. The engine only
///   reads its shape through [`Dataset`].
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<f64>`: evaluate `ℓ(θ)`. Returning
///   `±∞` marks `θ` as outside the model's domain ("search elsewhere");
///   `NaN` is an error.
/// - `dim() -> ParamDim`: number of free parameters, or
///   [`ParamDim::FromData`] to take the dataset's column count.
///
/// Optional:
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook called once
///   before the search starts.
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, central differences are used automatically.
/// - `constraint(&Theta, &Data) -> OptResult<Option<Penalty>>`: feasibility
///   check. `None` means `θ` is feasible; `Some(Penalty)` carries a strictly
///   positive penalty and the nearest feasible point.
/// - `draw(&Theta, rng) -> OptResult<Array1<f64>>`: one random draw from the
///   model at `θ`. Unused by the search itself.
pub trait LogLikelihood {
    type Data: Dataset;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64>;
    fn dim(&self) -> ParamDim;

    // Optional methods
    fn check(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<()> {
        Ok(())
    }

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }

    fn constraint(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Option<Penalty>> {
        Ok(None)
    }

    fn draw(&self, _theta: &Theta, _rng: &mut dyn RngCore) -> OptResult<Array1<f64>> {
        Err(OptError::DrawNotImplemented)
    }
}

/// Output of a violated feasibility constraint.
///
/// The cost at an infeasible `θ` is `-ℓ(corrected) + penalty`, which is
/// continuous at the boundary as long as `penalty → 0` with the violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Penalty {
    pub penalty: f64,
    pub corrected: Theta,
}

impl Penalty {
    pub fn new(penalty: f64, corrected: Theta) -> Self {
        Self { penalty, corrected }
    }
}

/// Declared dimensionality of a model's parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDim {
    Fixed(usize),
    /// Resolve to the dataset's independent-variable column count.
    FromData,
}

impl ParamDim {
    /// Resolve the declaration against `data`. Called once per search.
    pub fn resolve<D: Dataset>(self, data: &D) -> OptResult<usize> {
        let dim = match self {
            ParamDim::Fixed(n) => n,
            ParamDim::FromData => data.n_columns(),
        };
        if dim == 0 {
            return Err(OptError::ZeroDimension);
        }
        Ok(dim)
    }
}

/// Back-end search algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Derivative-free Nelder–Mead simplex.
    NelderMead,
    /// Fletcher–Reeves nonlinear conjugate gradient.
    FletcherReeves,
    /// BFGS quasi-Newton search.
    Bfgs,
    /// Polak–Ribière nonlinear conjugate gradient.
    PolakRibiere,
    /// Simulated annealing.
    Annealing,
}

impl Algorithm {
    /// Whether the back end consumes gradients.
    pub fn uses_gradient(self) -> bool {
        matches!(self, Algorithm::FletcherReeves | Algorithm::Bfgs | Algorithm::PolakRibiere)
    }
}

/// Search method: a back end plus the "force numerical gradient" switch.
///
/// # Method codes
/// Callers of the legacy interface select a method with a single integer
/// `code = outer * 100 + inner`:
///
/// | `outer` | algorithm                         |
/// |---------|-----------------------------------|
/// | 0       | Nelder–Mead simplex               |
/// | 2       | BFGS                              |
/// | 3       | Polak–Ribière conjugate gradient  |
/// | 5       | simulated annealing               |
/// | other   | Fletcher–Reeves (default, `100`)  |
///
/// `inner == 1` forces numerical differentiation even when the model has
/// an analytic gradient; any other `inner` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    pub algorithm: Algorithm,
    pub force_numerical_gradient: bool,
}

impl Method {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm, force_numerical_gradient: false }
    }

    /// Same back end with numerical gradients forced on.
    pub fn numerical(self) -> Self {
        Self { force_numerical_gradient: true, ..self }
    }

    /// Decode a legacy method code.
    pub fn from_code(code: i32) -> Self {
        let outer = code.div_euclid(100);
        let inner = code.rem_euclid(100);
        let algorithm = match outer {
            0 => Algorithm::NelderMead,
            2 => Algorithm::Bfgs,
            3 => Algorithm::PolakRibiere,
            5 => Algorithm::Annealing,
            _ => Algorithm::FletcherReeves,
        };
        Self { algorithm, force_numerical_gradient: inner == 1 }
    }

    /// Canonical legacy code for this method.
    pub fn code(&self) -> i32 {
        let outer = match self.algorithm {
            Algorithm::NelderMead => 0,
            Algorithm::FletcherReeves => 1,
            Algorithm::Bfgs => 2,
            Algorithm::PolakRibiere => 3,
            Algorithm::Annealing => 5,
        };
        outer * 100 + i32::from(self.force_numerical_gradient)
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::new(Algorithm::FletcherReeves)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.algorithm {
            Algorithm::NelderMead => "NM simplex",
            Algorithm::FletcherReeves => "FR cg",
            Algorithm::Bfgs => "BFGS cg",
            Algorithm::PolakRibiere => "PR cg",
            Algorithm::Annealing => "Annealing",
        };
        if self.force_numerical_gradient {
            write!(f, "{name} numerical")
        } else {
            write!(f, "{name}")
        }
    }
}

impl FromStr for Method {
    type Err = OptError;

    /// Parse a method name (case-insensitive).
    ///
    /// Accepts `"NM simplex"`, `"FR cg"`, `"BFGS cg"`, `"PR cg"` and
    /// `"Annealing"`, optionally followed by `" numerical"` to force
    /// numerical gradients. The empty string selects the default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (base, numerical) = match lowered.strip_suffix(" numerical") {
            Some(base) => (base.trim_end(), true),
            None => (lowered.as_str(), false),
        };
        let algorithm = match base {
            "nm simplex" | "simplex" => Algorithm::NelderMead,
            "" | "fr cg" => Algorithm::FletcherReeves,
            "bfgs cg" | "bfgs" => Algorithm::Bfgs,
            "pr cg" => Algorithm::PolakRibiere,
            "annealing" => Algorithm::Annealing,
            _ => {
                return Err(OptError::InvalidMethod {
                    name: s.to_string(),
                    reason: "Valid options are case insensitive 'NM simplex', 'FR cg', \
                             'BFGS cg', 'PR cg' or 'Annealing', optionally followed by \
                             ' numerical'.",
                });
            }
        };
        Ok(Method { algorithm, force_numerical_gradient: numerical })
    }
}

/// Choice of line search used inside the gradient back ends.
///
/// Variants:
/// - `MoreThuente`: More–Thuente line search.
/// - `HagerZhang`: Hager–Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Cooling schedule for simulated annealing.
///
/// - `n_tries`: attempts per step to find a feasible candidate.
/// - `iters_fixed_t`: Metropolis moves per temperature level.
/// - `k`: Boltzmann constant in `exp(-ΔE / (k T))`.
/// - `mu_t`: damping factor; `T ← T / mu_t` after each level.
/// - `t_min`: stop once the temperature falls below this.
/// - `t_initial`: starting temperature; `None` uses `|E(θ₀)|`, the energy of
///   the starting point.
/// - `seed`: seed for the RNG built by `maximize` (ignored by
///   `maximize_with_rng`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealSchedule {
    pub n_tries: usize,
    pub iters_fixed_t: usize,
    pub k: f64,
    pub mu_t: f64,
    pub t_min: f64,
    pub t_initial: Option<f64>,
    pub seed: u64,
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self {
            n_tries: 200,
            iters_fixed_t: 200,
            k: 1.0,
            mu_t: 1.002,
            t_min: 0.5,
            t_initial: None,
            seed: 0,
        }
    }
}

/// Search configuration.
///
/// Fields:
/// - `method`: back end and gradient mode (default Fletcher–Reeves).
/// - `starting_point`: initial `θ`; `None` fills with a back-end specific
///   constant (simplex `0.0`, gradient methods `0.1`, annealing `1.0`).
/// - `step_size`: simplex edge length / annealing step budget.
/// - `tolerance`: gradient ∞-norm or best-cost improvement over
///   `STALL_ITERS` iterations (gradient methods), or simplex size
///   (Nelder–Mead), below which the search has converged.
/// - `max_iter`: iteration cap (default 1500); caps simplex and gradient
///   iterations and cycling sweeps, not annealing, which runs its schedule.
/// - `delta`: central-difference step (default `1e-4`).
/// - `line_searcher`: line search for gradient methods.
/// - `verbose`: per-iteration diagnostics (feature `obs_slog`).
/// - `want_covariance`: run the covariance estimator at the optimum.
/// - `trace_path`: record every evaluated point and log-likelihood.
/// - `cycle_tolerance`: when `Some`, optimize one coordinate at a time until
///   the log-likelihood moves less than this between sweeps.
/// - `anneal`: cooling schedule for simulated annealing.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub method: Method,
    pub starting_point: Option<Theta>,
    pub step_size: f64,
    pub tolerance: f64,
    pub max_iter: usize,
    pub delta: f64,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub want_covariance: bool,
    pub trace_path: bool,
    pub cycle_tolerance: Option<f64>,
    pub anneal: AnnealSchedule,
}

impl MLEOptions {
    /// Create validated options; remaining fields take their defaults.
    pub fn new(
        method: Method, starting_point: Option<Theta>, step_size: f64, tolerance: f64,
        verbose: bool,
    ) -> OptResult<Self> {
        let opts = Self { method, starting_point, step_size, tolerance, verbose, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    /// Check every numeric field.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolerance`], [`OptError::InvalidStepSize`],
    ///   [`OptError::InvalidDelta`], [`OptError::InvalidMaxIter`],
    ///   [`OptError::InvalidSchedule`] for out-of-range values.
    /// - [`OptError::InvalidStartingPoint`] for non-finite starting entries.
    pub fn validate(&self) -> OptResult<()> {
        verify_tolerance(self.tolerance)?;
        verify_step_size(self.step_size)?;
        verify_delta(self.delta)?;
        verify_max_iter(self.max_iter)?;
        if let Some(tol) = self.cycle_tolerance {
            verify_tolerance(tol)?;
        }
        verify_schedule(&self.anneal)?;
        if let Some(start) = &self.starting_point {
            if let Some((index, &value)) = start.iter().enumerate().find(|(_, v)| !v.is_finite())
            {
                return Err(OptError::InvalidStartingPoint { index, value });
            }
        }
        Ok(())
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            starting_point: None,
            step_size: DEFAULT_STEP_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            max_iter: DEFAULT_MAX_ITER,
            delta: DEFAULT_DELTA,
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            want_covariance: false,
            trace_path: false,
            cycle_tolerance: None,
            anneal: AnnealSchedule::default(),
        }
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStatus {
    /// The convergence test passed (or the annealing schedule ran out).
    Converged,
    /// The iteration cap was hit; the best point found is still returned.
    IterationLimit,
    /// A back-end step failed; the best point before the failure is returned.
    Stopped { reason: String },
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: **log-likelihood** `ℓ(θ̂)`, re-evaluated at `theta_hat`.
/// - `status`: how the search ended.
/// - `iterations`: number of back-end iterations performed.
/// - `fn_evals`: function-evaluation counters (`cost_count`, `gradient_count`).
/// - `grad_norm`: L2 norm of the last cost gradient, if the back end kept one.
/// - `covariance`: `None` unless requested; then the parameter table or the
///   reason the information matrix could not be inverted.
/// - `info`: log-likelihood based information criteria.
/// - `path`: every evaluated point when `trace_path` was set.
/// - `options`: the configuration this outcome was produced with.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub status: SearchStatus,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub covariance: Option<InferenceResult<ParameterTable>>,
    pub info: InfoCriteria,
    pub path: Option<SearchPath>,
    pub options: MLEOptions,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from the finished search.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` (present and finite)
    ///   and `value` (finite).
    pub fn new(
        theta_hat_opt: Option<Theta>, value: Cost, status: SearchStatus, iterations: u64,
        fn_evals: FnEvalMap, grad_norm: Option<f64>, info: InfoCriteria, options: MLEOptions,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
            covariance: None,
            info,
            path: None,
            options,
        })
    }

    pub fn converged(&self) -> bool {
        self.status == SearchStatus::Converged
    }

    /// The estimated parameter table, if covariance was requested and succeeded.
    pub fn parameter_table(&self) -> Option<&ParameterTable> {
        self.covariance.as_ref().and_then(|c| c.as_ref().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The legacy method-code table and its inverse.
    // - Method-name parsing.
    // - Option validation and defaults.
    // - Dimension resolution.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Every row of the method-code table decodes to the documented back end.
    //
    // Given
    // -----
    // - Codes 0, 1, 100, 101, 200, 300, 301, 500, 400, 702.
    //
    // Expect
    // ------
    // - 0/1 → simplex, 2xx → BFGS, 3xx → PR, 5xx → annealing, any other
    //   outer → FR; `inner == 1` forces numerical gradients.
    fn method_from_code_matches_table() {
        let cases = [
            (0, Algorithm::NelderMead, false),
            (1, Algorithm::NelderMead, true),
            (100, Algorithm::FletcherReeves, false),
            (101, Algorithm::FletcherReeves, true),
            (200, Algorithm::Bfgs, false),
            (300, Algorithm::PolakRibiere, false),
            (301, Algorithm::PolakRibiere, true),
            (500, Algorithm::Annealing, false),
            (400, Algorithm::FletcherReeves, false),
            (702, Algorithm::FletcherReeves, false),
        ];
        for (code, algorithm, forced) in cases {
            let method = Method::from_code(code);
            assert_eq!(method.algorithm, algorithm, "code {code}");
            assert_eq!(method.force_numerical_gradient, forced, "code {code}");
        }
    }

    #[test]
    // Purpose
    // -------
    // `code()` is the inverse of `from_code` on canonical codes.
    //
    // Given
    // -----
    // - Every algorithm with and without forced numerical gradients.
    //
    // Expect
    // ------
    // - `Method::from_code(m.code()) == m`.
    fn method_code_round_trips() {
        for algorithm in [
            Algorithm::NelderMead,
            Algorithm::FletcherReeves,
            Algorithm::Bfgs,
            Algorithm::PolakRibiere,
            Algorithm::Annealing,
        ] {
            for method in [Method::new(algorithm), Method::new(algorithm).numerical()] {
                assert_eq!(Method::from_code(method.code()), method);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Method names parse case-insensitively, with the numerical suffix, and
    // unknown names are rejected.
    //
    // Given
    // -----
    // - "PR cg", "bfgs CG numerical", "", "newton".
    //
    // Expect
    // ------
    // - PR, BFGS+numerical, default FR, and `InvalidMethod` respectively.
    fn method_from_str_accepts_known_names() {
        assert_eq!("PR cg".parse::<Method>().unwrap(), Method::new(Algorithm::PolakRibiere));
        assert_eq!(
            "bfgs CG numerical".parse::<Method>().unwrap(),
            Method::new(Algorithm::Bfgs).numerical()
        );
        assert_eq!("".parse::<Method>().unwrap(), Method::default());
        assert!(matches!("newton".parse::<Method>(), Err(OptError::InvalidMethod { .. })));
    }

    #[test]
    // Purpose
    // -------
    // The default configuration matches the documented constants.
    //
    // Given
    // -----
    // - `MLEOptions::default()`.
    //
    // Expect
    // ------
    // - Fletcher–Reeves, 1500 iterations, δ = 1e-4, no starting point, and
    //   the default passes validation.
    fn mle_options_default_matches_documented_defaults() {
        let opts = MLEOptions::default();

        assert_eq!(opts.method.code(), 100);
        assert_eq!(opts.max_iter, 1500);
        assert_eq!(opts.delta, 1e-4);
        assert!(opts.starting_point.is_none());
        assert!(!opts.verbose);
        assert!(opts.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `MLEOptions::new` rejects non-positive tolerances and non-finite starts.
    //
    // Given
    // -----
    // - tolerance = 0, then a starting point containing NaN.
    //
    // Expect
    // ------
    // - `InvalidTolerance`, then `InvalidStartingPoint { index: 1 }`.
    fn mle_options_new_rejects_invalid_values() {
        let bad_tol = MLEOptions::new(Method::default(), None, 0.1, 0.0, false);
        assert!(matches!(bad_tol, Err(OptError::InvalidTolerance { .. })));

        let start = Some(ndarray::array![1.0, f64::NAN]);
        let bad_start = MLEOptions::new(Method::default(), start, 0.1, 1e-6, false);
        assert!(matches!(bad_start, Err(OptError::InvalidStartingPoint { index: 1, .. })));
    }

    #[test]
    // Purpose
    // -------
    // `ParamDim::FromData` resolves to the dataset's column count, and a zero
    // dimension is rejected.
    //
    // Given
    // -----
    // - A 4×3 design matrix, and the empty dataset `()`.
    //
    // Expect
    // ------
    // - `FromData` → 3 on the matrix; `FromData` → `ZeroDimension` on `()`.
    fn param_dim_resolves_from_data() {
        let x = ndarray::Array2::<f64>::zeros((4, 3));

        assert_eq!(ParamDim::FromData.resolve(&x).unwrap(), 3);
        assert_eq!(ParamDim::Fixed(2).resolve(&()).unwrap(), 2);
        assert_eq!(ParamDim::FromData.resolve(&()), Err(OptError::ZeroDimension));
    }
}
