//! Likelihood-based information criteria for a fitted model.
use crate::data::Dataset;

/// Information criteria at the maximized log-likelihood `ℓ`, for `k` free
/// parameters and `n` observations.
///
/// - `aic = 2k − 2ℓ`
/// - `aic_c = aic + 2k(k + 1) / (n − k − 1)`, `NaN` when `n − k − 1 ≤ 0`
/// - `bic = k ln n − 2ℓ`, `NaN` when `n = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoCriteria {
    pub log_likelihood: f64,
    pub aic: f64,
    pub aic_c: f64,
    pub bic: f64,
}

impl InfoCriteria {
    pub fn new(log_likelihood: f64, k: usize, n: usize) -> Self {
        let kf = k as f64;
        let nf = n as f64;
        let aic = 2.0 * kf - 2.0 * log_likelihood;
        let aic_c =
            if n > k + 1 { aic + 2.0 * kf * (kf + 1.0) / (nf - kf - 1.0) } else { f64::NAN };
        let bic = if n > 0 { kf * nf.ln() - 2.0 * log_likelihood } else { f64::NAN };
        Self { log_likelihood, aic, aic_c, bic }
    }

    /// Criteria for `k` parameters fitted on `data`.
    pub fn for_data<D: Dataset>(log_likelihood: f64, k: usize, data: &D) -> Self {
        Self::new(log_likelihood, k, data.n_obs())
    }
}
