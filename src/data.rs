//! data — the minimal view of a dataset the search engine needs.
//!
//! Purpose
//! -------
//! The engine never looks inside the data it estimates on: the payload is
//! forwarded unexamined into every [`LogLikelihood`] call. Two facts are
//! still needed from it, and [`Dataset`] exposes exactly those:
//!
//! - the number of observations, for degrees of freedom and information
//!   criteria, and
//! - the number of independent-variable columns, which resolves a model
//!   whose dimension is declared as [`ParamDim::FromData`].
//!
//! Conventions
//! -----------
//! - `()` is the empty dataset (models with no data, e.g. pure test
//!   objectives); it has zero observations and zero columns.
//! - A bare `Array1<f64>` is a single observed series: `len()` observations
//!   and one column.
//! - An `Array2<f64>` is a design matrix with one observation per row and one
//!   independent variable per column.
//! - [`RegressionData`] pairs a dependent vector with a design matrix; only
//!   the design columns count as independent variables.
//!
//! [`LogLikelihood`]: crate::optimization::loglik_optimizer::LogLikelihood
//! [`ParamDim::FromData`]: crate::optimization::loglik_optimizer::ParamDim::FromData
use ndarray::{Array1, Array2};

/// Result alias for dataset construction.
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised while assembling a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The dependent vector and the design matrix disagree on the number of
    /// observations.
    RowMismatch { y_len: usize, x_rows: usize },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::RowMismatch { y_len, x_rows } => {
                write!(
                    f,
                    "Dependent variable has {y_len} observations but the design matrix has \
                     {x_rows} rows."
                )
            }
        }
    }
}

/// Shape information the engine needs from a dataset.
pub trait Dataset {
    /// Number of observations.
    fn n_obs(&self) -> usize;

    /// Number of independent-variable columns.
    fn n_columns(&self) -> usize;
}

impl Dataset for () {
    fn n_obs(&self) -> usize {
        0
    }

    fn n_columns(&self) -> usize {
        0
    }
}

impl Dataset for Array1<f64> {
    fn n_obs(&self) -> usize {
        self.len()
    }

    fn n_columns(&self) -> usize {
        1
    }
}

impl Dataset for Array2<f64> {
    fn n_obs(&self) -> usize {
        self.nrows()
    }

    fn n_columns(&self) -> usize {
        self.ncols()
    }
}

/// Dependent variable `y` with design matrix `x` (one row per observation).
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionData {
    pub y: Array1<f64>,
    pub x: Array2<f64>,
}

impl RegressionData {
    /// Pair `y` with `x`.
    ///
    /// # Errors
    /// - [`DataError::RowMismatch`] when `y.len() != x.nrows()`.
    pub fn new(y: Array1<f64>, x: Array2<f64>) -> DataResult<Self> {
        if y.len() != x.nrows() {
            return Err(DataError::RowMismatch { y_len: y.len(), x_rows: x.nrows() });
        }
        Ok(Self { y, x })
    }
}

impl Dataset for RegressionData {
    fn n_obs(&self) -> usize {
        self.y.len()
    }

    fn n_columns(&self) -> usize {
        self.x.ncols()
    }
}
