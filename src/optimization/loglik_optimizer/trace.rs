//! Optional record of every point a search evaluates.
//!
//! When `MLEOptions::trace_path` is set, the cost adapter appends each point
//! the back end asks it to evaluate together with the log-likelihood seen
//! there (`-cost`, so penalized values for infeasible points). Points evaluated
//! while differencing are not recorded.
use crate::optimization::loglik_optimizer::{Cost, Theta};
use ndarray::{Array1, Array2};
use std::cell::RefCell;

/// Evaluated points in evaluation order.
///
/// - `points`: one row per evaluation (`n_evals × dim`).
/// - `loglik`: log-likelihood at each row; `-∞` outside the model's domain.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath {
    pub points: Array2<f64>,
    pub loglik: Array1<f64>,
}

impl SearchPath {
    pub fn len(&self) -> usize {
        self.loglik.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loglik.is_empty()
    }
}

/// Interior-mutable recorder shared with the cost adapter.
#[derive(Debug, Default)]
pub struct PathTrace {
    entries: RefCell<Vec<(Theta, f64)>>,
}

impl PathTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, theta: &Theta, cost: Cost) {
        self.entries.borrow_mut().push((theta.clone(), -cost));
    }

    /// Consume the recorder into a dense path over `dim` parameters.
    pub fn into_path(self, dim: usize) -> SearchPath {
        let entries = self.entries.into_inner();
        let mut points = Array2::zeros((entries.len(), dim));
        let mut loglik = Array1::zeros(entries.len());
        for (row, (theta, value)) in entries.into_iter().enumerate() {
            points.row_mut(row).assign(&theta);
            loglik[row] = value;
        }
        SearchPath { points, loglik }
    }
}
