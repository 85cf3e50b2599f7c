//! Integration tests for the maximum-likelihood pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end search: model adapter, penalty shell, every
//!   back end, restarts, and the covariance and information-criteria layer.
//! - Use a model with a closed-form MLE (normal location-scale) so that each
//!   method can be checked against the exact answer.
//!
//! Coverage
//! --------
//! - `optimization::loglik_optimizer`:
//!   - `maximize` with simplex, Fletcher–Reeves, Polak–Ribière, BFGS and
//!     annealing, with analytic and forced-numerical gradients, and both
//!     line searches.
//!   - The constrained `x ≤ 1` scenario (simplex and conjugate gradient),
//!     a nearly flat likelihood, annealing past `max_iter` levels, and the
//!     iteration cap.
//!   - `restart` monotonicity.
//! - `inference`:
//!   - Standard errors of the normal model against `σ̂ / √n`.
//!   - Information criteria on the outcome.
//!
//! Exclusions
//! ----------
//! - Low-level building blocks (finite differences, validation, the driver
//!   state machine) are covered by unit tests.
use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};
use rand::{RngCore, SeedableRng, distributions::Distribution, rngs::StdRng};
use rust_mle::{
    inference::InferenceError,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            AnnealSchedule, Grad, LogLikelihood, MLEOptions, Method, OptimOutcome, ParamDim,
            Penalty, SearchStatus, Theta, finite_diff::central_gradient, maximize, restart,
            traits::LineSearcher,
        },
    },
};
use statrs::distribution::Normal as NormalDist;

const SIGMA_FLOOR: f64 = 1e-3;

/// Normal location-scale model, θ = (μ, σ), with σ kept above a small floor
/// through the constraint.
struct Normal;

impl LogLikelihood for Normal {
    type Data = Array1<f64>;

    fn value(&self, theta: &Theta, data: &Array1<f64>) -> OptResult<f64> {
        let (mu, sigma) = (theta[0], theta[1]);
        let n = data.len() as f64;
        let ss = data.iter().map(|x| (x - mu).powi(2)).sum::<f64>();
        let norm = -0.5 * n * (2.0 * std::f64::consts::PI).ln();
        Ok(norm - n * sigma.ln() - ss / (2.0 * sigma * sigma))
    }

    fn dim(&self) -> ParamDim {
        ParamDim::Fixed(2)
    }

    fn grad(&self, theta: &Theta, data: &Array1<f64>) -> OptResult<Grad> {
        let (mu, sigma) = (theta[0], theta[1]);
        let n = data.len() as f64;
        let s1 = data.iter().map(|x| x - mu).sum::<f64>();
        let ss = data.iter().map(|x| (x - mu).powi(2)).sum::<f64>();
        Ok(array![s1 / sigma.powi(2), -n / sigma + ss / sigma.powi(3)])
    }

    fn constraint(&self, theta: &Theta, _data: &Array1<f64>) -> OptResult<Option<Penalty>> {
        if theta[1] >= SIGMA_FLOOR {
            return Ok(None);
        }
        Ok(Some(Penalty::new(SIGMA_FLOOR - theta[1], array![theta[0], SIGMA_FLOOR])))
    }

    fn draw(&self, theta: &Theta, rng: &mut dyn RngCore) -> OptResult<Array1<f64>> {
        let dist = NormalDist::new(theta[0], theta[1])
            .map_err(|_| OptError::InvalidStartingPoint { index: 1, value: theta[1] })?;
        Ok(array![dist.sample(rng)])
    }
}

/// Same model, but its analytic gradient is poisoned with NaN.
struct PoisonedGradient;

impl LogLikelihood for PoisonedGradient {
    type Data = Array1<f64>;

    fn value(&self, theta: &Theta, data: &Array1<f64>) -> OptResult<f64> {
        Normal.value(theta, data)
    }

    fn dim(&self) -> ParamDim {
        ParamDim::Fixed(2)
    }

    fn grad(&self, _theta: &Theta, _data: &Array1<f64>) -> OptResult<Grad> {
        Ok(array![f64::NAN, f64::NAN])
    }

    fn constraint(&self, theta: &Theta, data: &Array1<f64>) -> OptResult<Option<Penalty>> {
        Normal.constraint(theta, data)
    }
}

/// ℓ(x) = −(x − 3)², optionally restricted to x ≤ 1.
struct Parabola {
    upper: Option<f64>,
}

impl LogLikelihood for Parabola {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
        Ok(-(theta[0] - 3.0).powi(2))
    }

    fn dim(&self) -> ParamDim {
        ParamDim::Fixed(1)
    }

    fn constraint(&self, theta: &Theta, _data: &()) -> OptResult<Option<Penalty>> {
        match self.upper {
            Some(upper) if theta[0] > upper => {
                Ok(Some(Penalty::new(theta[0] - upper, array![upper])))
            }
            _ => Ok(None),
        }
    }
}

/// ℓ(x) = −1000 − (x − 3)²: the parabola's peak, far below zero.
struct DeepParabola;

impl LogLikelihood for DeepParabola {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
        Ok(-1000.0 - (theta[0] - 3.0).powi(2))
    }

    fn dim(&self) -> ParamDim {
        ParamDim::Fixed(1)
    }
}

/// ℓ(x) = −1e-4 · (x − 3)²: a nearly flat likelihood.
struct FlatParabola;

impl LogLikelihood for FlatParabola {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
        Ok(-1e-4 * (theta[0] - 3.0).powi(2))
    }

    fn dim(&self) -> ParamDim {
        ParamDim::Fixed(1)
    }
}

/// Purpose
/// -------
/// Draw `n` observations from `N(2, 1.5²)` through the model's own `draw`.
fn normal_sample(n: usize) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(7);
    let truth = array![2.0, 1.5];
    Array1::from_iter((0..n).map(|_| Normal.draw(&truth, &mut rng).unwrap()[0]))
}

/// Closed-form MLE `(mean, √(Σ(x − mean)² / n))`.
fn closed_form(data: &Array1<f64>) -> (f64, f64) {
    let n = data.len() as f64;
    let mean = data.sum() / n;
    let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn fit(code: i32, start: Theta, data: &Array1<f64>) -> OptimOutcome {
    let opts = MLEOptions {
        method: Method::from_code(code),
        starting_point: Some(start),
        tolerance: 1e-8,
        ..MLEOptions::default()
    };
    maximize(&Normal, data, &opts).unwrap()
}

#[test]
// Purpose
// -------
// Every deterministic back end recovers the closed-form normal MLE from
// several starting points, with analytic and numerical gradients.
//
// Given
// -----
// - 120 draws from N(2, 1.5²); methods 0, 100, 101, 200, 201, 300, 301;
//   starts (0, 1), (4, 3), (1.5, 0.5).
//
// Expect
// ------
// - μ̂ and σ̂ within 1e-3 of the sample mean and MLE standard deviation.
fn every_method_recovers_normal_mle_from_several_starts() {
    let data = normal_sample(120);
    let (mean, sd) = closed_form(&data);

    for code in [0, 100, 101, 200, 201, 300, 301] {
        for start in [array![0.0, 1.0], array![4.0, 3.0], array![1.5, 0.5]] {
            let out = fit(code, start.clone(), &data);

            assert_abs_diff_eq!(out.theta_hat[0], mean, epsilon = 1e-3);
            assert_abs_diff_eq!(out.theta_hat[1], sd, epsilon = 1e-3);
            assert_eq!(out.options.method, Method::from_code(code));
        }
    }
}

#[test]
// Purpose
// -------
// The Hager–Zhang line search is a drop-in alternative for gradient methods.
//
// Given
// -----
// - The normal sample, FR/PR/BFGS with `LineSearcher::HagerZhang`.
//
// Expect
// ------
// - The closed-form MLE within 1e-3.
fn hager_zhang_line_search_recovers_normal_mle() {
    let data = normal_sample(120);
    let (mean, sd) = closed_form(&data);

    for code in [100, 200, 300] {
        let opts = MLEOptions {
            method: Method::from_code(code),
            starting_point: Some(array![1.0, 2.0]),
            tolerance: 1e-8,
            line_searcher: "HagerZhang".parse::<LineSearcher>().unwrap(),
            ..MLEOptions::default()
        };

        let out = maximize(&Normal, &data, &opts).unwrap();

        assert_abs_diff_eq!(out.theta_hat[0], mean, epsilon = 1e-3);
        assert_abs_diff_eq!(out.theta_hat[1], sd, epsilon = 1e-3);
    }
}

#[test]
// Purpose
// -------
// Simulated annealing lands near the optimum, and a restart with the
// simplex polishes the estimate without ever lowering the log-likelihood.
//
// Given
// -----
// - The normal sample, annealing from (0, 1) with a short schedule, then a
//   simplex restart with scale 0.1.
//
// Expect
// ------
// - Annealing within 0.05 of the MLE; the restart within 1e-3 and
//   ℓ(restart) ≥ ℓ(annealing).
fn annealing_then_restart_reaches_normal_mle() {
    // Arrange
    let data = normal_sample(120);
    let (mean, sd) = closed_form(&data);
    let opts = MLEOptions {
        method: Method::from_code(500),
        starting_point: Some(array![0.0, 1.0]),
        anneal: AnnealSchedule {
            iters_fixed_t: 200,
            mu_t: 1.05,
            t_initial: Some(10.0),
            t_min: 1e-4,
            seed: 3,
            ..AnnealSchedule::default()
        },
        ..MLEOptions::default()
    };

    // Act
    let annealed = maximize(&Normal, &data, &opts).unwrap();
    let annealed_value = annealed.value;
    let polished = restart(&Normal, &data, annealed.clone(), Method::from_code(0), 0.1).unwrap();

    // Assert
    assert_eq!(annealed.status, SearchStatus::Converged);
    assert_abs_diff_eq!(annealed.theta_hat[0], mean, epsilon = 0.05);
    assert_abs_diff_eq!(annealed.theta_hat[1], sd, epsilon = 0.05);
    assert!(polished.value >= annealed_value);
    assert_abs_diff_eq!(polished.theta_hat[0], mean, epsilon = 1e-3);
    assert_abs_diff_eq!(polished.theta_hat[1], sd, epsilon = 1e-3);
}

#[test]
// Purpose
// -------
// Restarting never lowers the log-likelihood, whatever the new method.
//
// Given
// -----
// - A simplex fit capped at 5 iterations, restarted with each method code.
//
// Expect
// ------
// - ℓ(restart) ≥ ℓ(prior) in every case.
fn restart_is_monotone_across_methods() {
    let data = normal_sample(60);
    let opts = MLEOptions {
        method: Method::from_code(0),
        starting_point: Some(array![0.0, 1.0]),
        max_iter: 5,
        ..MLEOptions::default()
    };
    let prior = maximize(&Normal, &data, &opts).unwrap();
    assert_eq!(prior.status, SearchStatus::IterationLimit);

    for code in [0, 100, 101, 200, 300] {
        let kept = restart(&Normal, &data, prior.clone(), Method::from_code(code), 1.0).unwrap();

        assert!(kept.value >= prior.value, "method {code} lowered the log-likelihood");
    }
}

#[test]
// Purpose
// -------
// The one-parameter parabola from x = 10 converges to its maximum.
//
// Given
// -----
// - ℓ(x) = −(x − 3)², Fletcher–Reeves (default method), tolerance 1e-6.
//
// Expect
// ------
// - Converged with x within 1e-4 of 3.
fn parabola_converges_to_three() {
    let opts = MLEOptions::new(Method::default(), Some(array![10.0]), 0.05, 1e-6, false).unwrap();

    let out = maximize(&Parabola { upper: None }, &(), &opts).unwrap();

    assert_eq!(out.status, SearchStatus::Converged);
    assert_abs_diff_eq!(out.theta_hat[0], 3.0, epsilon = 1e-4);
    assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-8);
}

#[test]
// Purpose
// -------
// A constraint that excludes the unconstrained optimum holds the simplex at
// the boundary.
//
// Given
// -----
// - ℓ(x) = −(x − 3)² with x ≤ 1; the simplex from 0.
//
// Expect
// ------
// - Converged with x within 1e-3 of 1; ℓ reported at the feasible point
//   (−4).
fn constraint_holds_simplex_at_boundary() {
    let model = Parabola { upper: Some(1.0) };
    let simplex = MLEOptions {
        method: Method::from_code(0),
        tolerance: 1e-10,
        ..MLEOptions::default()
    };

    let out = maximize(&model, &(), &simplex).unwrap();

    assert_eq!(out.status, SearchStatus::Converged);
    assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(out.value, -4.0, epsilon = 1e-2);
}

#[test]
// Purpose
// -------
// Conjugate-gradient searches converge on a constraint boundary, where the
// penalized cost has a kink and the gradient never vanishes.
//
// Given
// -----
// - ℓ(x) = −(x − 3)² with x ≤ 1; Fletcher–Reeves and Polak–Ribière from
//   x = 10, step 0.05, tolerance 1e-6.
//
// Expect
// ------
// - `Converged` before the iteration cap, x within 1e-3 of 1, ℓ ≈ −4.
fn gradient_search_converges_at_constraint_boundary() {
    let model = Parabola { upper: Some(1.0) };

    for code in [100, 300] {
        let opts =
            MLEOptions::new(Method::from_code(code), Some(array![10.0]), 0.05, 1e-6, false)
                .unwrap();

        let out = maximize(&model, &(), &opts).unwrap();

        assert_eq!(out.status, SearchStatus::Converged, "method {code}");
        assert!(out.iterations < opts.max_iter);
        assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.value, -4.0, epsilon = 1e-2);
    }
}

#[test]
// Purpose
// -------
// On a nearly flat likelihood the simplex keeps contracting until it sits
// on the optimum instead of stopping once vertex values look alike.
//
// Given
// -----
// - ℓ(x) = −1e-4 · (x − 3)², the simplex from 0 with default tolerance.
//
// Expect
// ------
// - `Converged` with x within 1e-3 of 3.
fn simplex_converges_on_flat_likelihood() {
    let opts = MLEOptions { method: Method::from_code(0), ..MLEOptions::default() };

    let out = maximize(&FlatParabola, &(), &opts).unwrap();

    assert_eq!(out.status, SearchStatus::Converged);
    assert_abs_diff_eq!(out.theta_hat[0], 3.0, epsilon = 1e-3);
}

#[test]
// Purpose
// -------
// Annealing runs its full cooling schedule even when that takes more
// temperature levels than `max_iter`.
//
// Given
// -----
// - ℓ(x) = −1000 − (x − 3)² (starting energy ≈ 1004, so about 3800 levels
//   down to t_min = 0.5 at mu_t = 1.002), step size 1, 20 moves per level.
//
// Expect
// ------
// - `Converged` after more than `max_iter` levels, x within 0.1 of 3.
fn annealing_ignores_iteration_cap() {
    let opts = MLEOptions {
        method: Method::from_code(500),
        step_size: 1.0,
        anneal: AnnealSchedule { iters_fixed_t: 20, seed: 5, ..AnnealSchedule::default() },
        ..MLEOptions::default()
    };

    let out = maximize(&DeepParabola, &(), &opts).unwrap();

    assert_eq!(out.status, SearchStatus::Converged);
    assert!(out.iterations > opts.max_iter);
    assert_abs_diff_eq!(out.theta_hat[0], 3.0, epsilon = 0.1);
}

#[test]
// Purpose
// -------
// Forcing numerical gradients bypasses the model's analytic gradient.
//
// Given
// -----
// - A model whose analytic gradient is NaN; BFGS with code 200 and 201.
//
// Expect
// ------
// - 200 fails with `OptError::InvalidGradient`; 201 fits the MLE.
fn forced_numerical_gradient_bypasses_analytic_gradient() {
    let data = normal_sample(80);
    let (mean, sd) = closed_form(&data);
    let opts = |code| MLEOptions {
        method: Method::from_code(code),
        starting_point: Some(array![1.0, 1.0]),
        tolerance: 1e-8,
        ..MLEOptions::default()
    };

    let analytic = maximize(&PoisonedGradient, &data, &opts(200));
    let numerical = maximize(&PoisonedGradient, &data, &opts(201)).unwrap();

    assert!(matches!(analytic, Err(OptError::InvalidGradient { .. })));
    assert_abs_diff_eq!(numerical.theta_hat[0], mean, epsilon = 1e-3);
    assert_abs_diff_eq!(numerical.theta_hat[1], sd, epsilon = 1e-3);
}

#[test]
// Purpose
// -------
// Central differences agree with the analytic gradient of the normal model.
//
// Given
// -----
// - The normal sample at θ = (1.7, 1.2), δ = 1e-4.
//
// Expect
// ------
// - Agreement within 1e-4 relative to the gradient scale.
fn numerical_gradient_matches_analytic() {
    let data = normal_sample(50);
    let theta = array![1.7, 1.2];

    let analytic = Normal.grad(&theta, &data).unwrap();
    let numeric = central_gradient(&|t: &Theta| Normal.value(t, &data), &theta, 1e-4).unwrap();

    for i in 0..2 {
        assert_abs_diff_eq!(numeric[i], analytic[i], epsilon = 1e-4 * analytic[i].abs().max(1.0));
    }
}

#[test]
// Purpose
// -------
// Hessian-based standard errors match the normal model's asymptotics.
//
// Given
// -----
// - 400 draws, BFGS fit with `want_covariance`.
//
// Expect
// ------
// - se(μ̂) ≈ σ̂/√n, se(σ̂) ≈ σ̂/√(2n) (relative error < 1e-3);
//   df = n − 2; AIC = 4 − 2ℓ; BIC = 2 ln n − 2ℓ.
fn covariance_matches_normal_asymptotics() {
    // Arrange
    let data = normal_sample(400);
    let n = data.len() as f64;
    let opts = MLEOptions {
        method: Method::from_code(200),
        starting_point: Some(array![1.0, 1.0]),
        tolerance: 1e-8,
        want_covariance: true,
        ..MLEOptions::default()
    };

    // Act
    let out = maximize(&Normal, &data, &opts).unwrap();

    // Assert
    let table = out.parameter_table().expect("covariance requested");
    let sd = out.theta_hat[1];
    assert_abs_diff_eq!(table.std_err[0] / (sd / n.sqrt()), 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(table.std_err[1] / (sd / (2.0 * n).sqrt()), 1.0, epsilon = 1e-3);
    assert_eq!(table.df, n - 2.0);
    assert!(table.p_two_tailed[0] < 1e-6);
    assert_abs_diff_eq!(out.info.aic, 4.0 - 2.0 * out.value, epsilon = 1e-9);
    assert_abs_diff_eq!(out.info.bic, 2.0 * n.ln() - 2.0 * out.value, epsilon = 1e-9);
}

#[test]
// Purpose
// -------
// A covariance failure is reported on the outcome without failing the fit.
//
// Given
// -----
// - A two-parameter model that ignores its second parameter.
//
// Expect
// ------
// - The fit succeeds and `covariance` holds `SingularInformation`.
fn singular_information_is_reported_on_outcome() {
    struct Unidentified;

    impl LogLikelihood for Unidentified {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
            Ok(-(theta[0] - 1.0).powi(2))
        }

        fn dim(&self) -> ParamDim {
            ParamDim::Fixed(2)
        }
    }

    let opts = MLEOptions {
        method: Method::from_code(0),
        want_covariance: true,
        ..MLEOptions::default()
    };

    let out = maximize(&Unidentified, &(), &opts).unwrap();

    assert_eq!(out.covariance, Some(Err(InferenceError::SingularInformation { dim: 2 })));
    assert!(out.parameter_table().is_none());
}

#[test]
// Purpose
// -------
// Hitting the iteration cap is a normal outcome, not an error.
//
// Given
// -----
// - The normal sample, Fletcher–Reeves from (0, 5), max_iter = 1.
//
// Expect
// ------
// - `SearchStatus::IterationLimit`, one iteration, finite log-likelihood.
fn iteration_cap_returns_best_point() {
    let data = normal_sample(60);
    let opts = MLEOptions {
        starting_point: Some(array![0.0, 5.0]),
        max_iter: 1,
        tolerance: 1e-12,
        ..MLEOptions::default()
    };

    let out = maximize(&Normal, &data, &opts).unwrap();

    assert_eq!(out.status, SearchStatus::IterationLimit);
    assert_eq!(out.iterations, 1);
    assert!(out.value.is_finite());
    assert!(!out.converged());
}

#[test]
// Purpose
// -------
// Method names and legacy codes select the same back ends.
//
// Given
// -----
// - Names with and without the " numerical" suffix, and their codes.
//
// Expect
// ------
// - Parsed methods equal `from_code`, and `code()` inverts `from_code`.
fn method_names_and_codes_agree() {
    let pairs = [
        ("NM simplex", 0),
        ("FR cg", 100),
        ("fr cg numerical", 101),
        ("BFGS cg", 200),
        ("BFGS cg numerical", 201),
        ("PR cg", 300),
        ("Annealing", 500),
    ];

    for (name, code) in pairs {
        let parsed: Method = name.parse().unwrap();

        assert_eq!(parsed, Method::from_code(code));
        assert_eq!(parsed.code(), code);
    }
    assert_eq!(Method::from_code(700), Method::default());
    assert!(matches!("Newton".parse::<Method>(), Err(OptError::InvalidMethod { .. })));
}
