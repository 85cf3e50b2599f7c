//! Nelder–Mead simplex search with a geometric stopping rule.
//!
//! Purpose
//! -------
//! Derivative-free back end for [`Algorithm::NelderMead`]. The moves are the
//! classic reflection / expansion / contraction / shrink steps; the search
//! stops once the simplex itself is small, i.e. the mean Euclidean distance
//! from its vertices to their centroid falls below the tolerance.
//!
//! Invariants & assumptions
//! ------------------------
//! - Vertices are kept sorted by cost, best first; the state's parameter is
//!   always the best vertex.
//! - A `+∞` cost (outside the model's domain) is an ordinary, worst-possible
//!   value; the adapter never hands back `NaN`.
//!
//! [`Algorithm::NelderMead`]: crate::optimization::loglik_optimizer::Algorithm::NelderMead
use crate::optimization::loglik_optimizer::types::{Cost, Theta};
use argmin::{
    core::{
        ArgminError, CostFunction, Error, IterState, KV, Problem, Solver, TerminationReason,
        TerminationStatus,
    },
    kv,
};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Mean Euclidean distance from `vertices` to their centroid.
///
/// Returns `+∞` for an empty slice.
pub fn simplex_size(vertices: &[Theta]) -> f64 {
    let Some(first) = vertices.first() else {
        return f64::INFINITY;
    };
    let n = vertices.len() as f64;
    let centroid = vertices.iter().fold(Theta::zeros(first.len()), |acc, v| acc + v) / n;
    vertices.iter().map(|v| (v - &centroid).mapv(|d| d * d).sum().sqrt()).sum::<f64>() / n
}

/// Nelder–Mead over `(Theta, Cost)` that converges on simplex size.
#[derive(Debug, Clone)]
pub struct NelderMeadSimplex {
    initial: Vec<Theta>,
    vertices: Vec<(Theta, Cost)>,
    tolerance: f64,
}

impl NelderMeadSimplex {
    /// Search from the given vertices (`dim + 1` points), stopping once the
    /// simplex size drops below `tolerance`.
    pub fn new(vertices: Vec<Theta>, tolerance: f64) -> Self {
        Self { initial: vertices, vertices: Vec::new(), tolerance }
    }

    /// Current simplex size (`+∞` before initialization).
    pub fn size(&self) -> f64 {
        let points: Vec<Theta> = self.vertices.iter().map(|(v, _)| v.clone()).collect();
        simplex_size(&points)
    }

    fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    /// Centroid of every vertex but the worst.
    fn centroid(&self) -> Theta {
        let kept = &self.vertices[..self.vertices.len() - 1];
        let dim = kept[0].0.len();
        kept.iter().fold(Theta::zeros(dim), |acc, (v, _)| acc + v) / kept.len() as f64
    }

    /// Pull every vertex halfway toward the best one.
    fn shrink<O>(&mut self, problem: &mut Problem<O>) -> Result<(), Error>
    where
        O: CostFunction<Param = Theta, Output = Cost>,
    {
        let best = self.vertices[0].0.clone();
        for (vertex, cost) in self.vertices.iter_mut().skip(1) {
            *vertex = &best + &((&*vertex - &best) * SHRINK);
            *cost = problem.cost(vertex)?;
        }
        Ok(())
    }

    fn replace_worst(&mut self, vertex: Theta, cost: Cost) {
        if let Some(worst) = self.vertices.last_mut() {
            *worst = (vertex, cost);
        }
    }

    fn best_state(
        &self, state: IterState<Theta, (), (), (), (), Cost>,
    ) -> IterState<Theta, (), (), (), (), Cost> {
        let (best, cost) = self.vertices[0].clone();
        state.param(best).cost(cost)
    }
}

impl<O> Solver<O, IterState<Theta, (), (), (), (), Cost>> for NelderMeadSimplex
where
    O: CostFunction<Param = Theta, Output = Cost>,
{
    const NAME: &'static str = "Nelder-Mead simplex";

    fn init(
        &mut self, problem: &mut Problem<O>, state: IterState<Theta, (), (), (), (), Cost>,
    ) -> Result<(IterState<Theta, (), (), (), (), Cost>, Option<KV>), Error> {
        if self.initial.len() < 2 {
            return Err(ArgminError::InvalidParameter {
                text: "Nelder-Mead needs at least two vertices".to_string(),
            }
            .into());
        }
        self.vertices = self
            .initial
            .iter()
            .map(|v| Ok((v.clone(), problem.cost(v)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        self.sort();
        Ok((self.best_state(state), Some(kv!("size" => self.size();))))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: IterState<Theta, (), (), (), (), Cost>,
    ) -> Result<(IterState<Theta, (), (), (), (), Cost>, Option<KV>), Error> {
        let n = self.vertices.len();
        if n < 2 {
            return Err(ArgminError::NotInitialized {
                text: "Nelder-Mead simplex was not initialized".to_string(),
            }
            .into());
        }
        let centroid = self.centroid();
        let (worst, worst_cost) = self.vertices[n - 1].clone();
        let best_cost = self.vertices[0].1;
        let second_worst_cost = self.vertices[n - 2].1;

        let reflected = &centroid + &((&centroid - &worst) * REFLECTION);
        let reflected_cost = problem.cost(&reflected)?;

        let action = if reflected_cost < best_cost {
            let expanded = &centroid + &((&reflected - &centroid) * EXPANSION);
            let expanded_cost = problem.cost(&expanded)?;
            if expanded_cost < reflected_cost {
                self.replace_worst(expanded, expanded_cost);
                "expansion"
            } else {
                self.replace_worst(reflected, reflected_cost);
                "reflection"
            }
        } else if reflected_cost < second_worst_cost {
            self.replace_worst(reflected, reflected_cost);
            "reflection"
        } else if reflected_cost < worst_cost {
            let contracted = &centroid + &((&reflected - &centroid) * CONTRACTION);
            let contracted_cost = problem.cost(&contracted)?;
            if contracted_cost <= reflected_cost {
                self.replace_worst(contracted, contracted_cost);
                "outside contraction"
            } else {
                self.shrink(problem)?;
                "shrink"
            }
        } else {
            let contracted = &centroid + &((&worst - &centroid) * CONTRACTION);
            let contracted_cost = problem.cost(&contracted)?;
            if contracted_cost < worst_cost {
                self.replace_worst(contracted, contracted_cost);
                "inside contraction"
            } else {
                self.shrink(problem)?;
                "shrink"
            }
        };
        self.sort();

        Ok((self.best_state(state), Some(kv!("action" => action; "size" => self.size();))))
    }

    fn terminate(&mut self, _state: &IterState<Theta, (), (), (), (), Cost>) -> TerminationStatus {
        if self.size() < self.tolerance {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::{SearchStatus, run::drive};
    use approx::assert_abs_diff_eq;
    use argmin::core::State;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The size measure.
    // - Convergence on a badly scaled objective, where cost differences are
    //   tiny long before the vertices are close to the optimum.
    // -------------------------------------------------------------------------

    /// c(x) = scale · (x − 3)².
    struct Shallow {
        scale: f64,
    }

    impl CostFunction for Shallow {
        type Param = Theta;
        type Output = Cost;

        fn cost(&self, theta: &Theta) -> Result<Cost, Error> {
            Ok(self.scale * (theta[0] - 3.0).powi(2))
        }
    }

    #[test]
    // Purpose
    // -------
    // Size is the mean distance of the vertices to their centroid.
    //
    // Given
    // -----
    // - Vertices (0, 0), (2, 0), (1, 3); centroid (1, 1).
    //
    // Expect
    // ------
    // - (√2 + √2 + 2) / 3.
    fn simplex_size_is_mean_distance_to_centroid() {
        let vertices = vec![array![0.0, 0.0], array![2.0, 0.0], array![1.0, 3.0]];

        let size = simplex_size(&vertices);

        assert_abs_diff_eq!(size, (2.0 * 2f64.sqrt() + 2.0) / 3.0, epsilon = 1e-12);
        assert_eq!(simplex_size(&[]), f64::INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // A flat objective does not stop the search before the simplex has
    // collapsed onto the optimum.
    //
    // Given
    // -----
    // - c(x) = 1e-4 · (x − 3)², vertices 0 and 0.05, tolerance 1e-5.
    //
    // Expect
    // ------
    // - `Converged` with the best vertex within 1e-4 of 3.
    fn flat_objective_converges_on_simplex_size() {
        // Arrange
        let solver = NelderMeadSimplex::new(vec![array![0.0], array![0.05]], 1e-5);
        let state = IterState::new().param(array![0.0]).max_iters(1500);

        // Act
        let finished = drive(Shallow { scale: 1e-4 }, solver, state, |_| false, None).unwrap();

        // Assert
        assert_eq!(finished.status, SearchStatus::Converged);
        assert_abs_diff_eq!(finished.state.get_best_param().unwrap()[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // Too few vertices are rejected at initialization.
    //
    // Given
    // -----
    // - A single vertex.
    //
    // Expect
    // ------
    // - `drive` returns `Err`.
    fn single_vertex_is_rejected() {
        let solver = NelderMeadSimplex::new(vec![array![0.0]], 1e-5);
        let state = IterState::new().param(array![0.0]).max_iters(10);

        assert!(drive(Shallow { scale: 1.0 }, solver, state, |_| false, None).is_err());
    }
}
