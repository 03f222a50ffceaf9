//! Paired return statistics
//!
//! Log returns and the population moments used for beta and Pearson
//! correlation. Degenerate (zero-variance) inputs never divide by zero:
//! the derived ratios come back as `None`.

use crate::{ensure_len, MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Daily log returns `ln(P_i / P_{i-1})`.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>> {
    ensure_len(prices, 2, "log returns")?;
    if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
        return Err(MathError::InvalidInput(
            "Log returns require finite positive prices".to_string(),
        ));
    }

    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

/// Population covariance and variances of two equally long samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairStatistics {
    pub n: usize,
    pub covariance: f64,
    pub variance_x: f64,
    pub variance_y: f64,
}

impl PairStatistics {
    /// Compute the moments of `x` against `y`.
    pub fn from_samples(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "Paired samples differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        ensure_len(x, 2, "paired statistics")?;

        Ok(Self {
            n: x.len(),
            covariance: x.iter().population_covariance(y.iter()),
            variance_x: x.iter().population_variance(),
            variance_y: y.iter().population_variance(),
        })
    }

    /// Sensitivity of `x` to `y`: `Cov(x, y) / Var(y)`.
    pub fn beta(&self) -> Option<f64> {
        if self.variance_y <= 0.0 || !self.variance_y.is_finite() {
            return None;
        }
        Some(self.covariance / self.variance_y)
    }

    /// Pearson correlation, bounded to [-1, 1].
    pub fn correlation(&self) -> Option<f64> {
        if self.variance_x <= 0.0 || self.variance_y <= 0.0 {
            return None;
        }
        let rho = self.covariance / (self.variance_x.sqrt() * self.variance_y.sqrt());
        rho.is_finite().then(|| rho.clamp(-1.0, 1.0))
    }
}
