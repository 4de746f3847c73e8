//! Global spatial autocorrelation statistics.
//!
//! - **moran**: Moran's I with analytic and permutation tests
//! - **geary**: Geary's C with analytic and permutation tests
//! - **permutation**: Monte Carlo machinery shared by both statistics
//! - **normal**: standard normal tail probabilities

pub mod geary;
pub mod moran;
pub mod normal;
pub mod permutation;

pub use geary::{geary_c, geary_mc, geary_test, GearyResult};
pub use moran::{moran_i, moran_mc, moran_test, MoranResult};
pub use permutation::{MonteCarloConfig, PermutationTest};

use crate::error::{Error, Result};
use crate::weights::WeightMatrix;

/// Alternative hypothesis, phrased in terms of spatial autocorrelation.
///
/// `Greater` tests for positive autocorrelation for both statistics, which is
/// a large I but a small C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Greater,
    Less,
}

/// Settings for the closed-form significance test.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticConfig {
    /// Variance under randomisation (`true`) or under normality (`false`).
    pub randomisation: bool,
    pub alternative: Alternative,
}

impl Default for AnalyticConfig {
    fn default() -> Self {
        Self {
            randomisation: true,
            alternative: Alternative::TwoSided,
        }
    }
}

/// Outcome of the closed-form test.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticTest {
    pub variance: f64,
    /// Standard deviate; positive means positive spatial autocorrelation.
    pub z_score: f64,
    pub p_value: f64,
    pub randomisation: bool,
    pub alternative: Alternative,
}

impl AnalyticTest {
    pub(crate) fn new(z_score: f64, variance: f64, config: &AnalyticConfig) -> Self {
        Self {
            variance,
            z_score,
            p_value: normal::p_value(z_score, config.alternative),
            randomisation: config.randomisation,
            alternative: config.alternative,
        }
    }
}

/// Validated inputs: deviations from the mean and their sum of squares.
#[derive(Debug, Clone)]
pub(crate) struct Deviations {
    pub values: Vec<f64>,
    pub sum_sq: f64,
}

impl Deviations {
    pub fn new(values: &[f64], w: &WeightMatrix) -> Result<Self> {
        let n = w.n();
        if values.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: values.len(),
            });
        }
        if n < 2 {
            return Err(Error::InsufficientData {
                required: 2,
                actual: n,
            });
        }
        if w.s0() == 0.0 {
            return Err(Error::NoNeighbors);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "values",
                reason: format!("value at index {} is {}", index, values[index]),
            });
        }
        if values.iter().all(|&v| v == values[0]) {
            return Err(Error::ZeroVariance);
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let deviations: Vec<f64> = values.iter().map(|v| v - mean).collect();
        let sum_sq = deviations.iter().map(|d| d * d).sum::<f64>();
        if sum_sq == 0.0 {
            return Err(Error::ZeroVariance);
        }

        Ok(Self {
            values: deviations,
            sum_sq,
        })
    }

    pub fn n(&self) -> f64 {
        self.values.len() as f64
    }

    /// Sample kurtosis `n Σd⁴ / (Σd²)²`.
    pub fn kurtosis(&self) -> f64 {
        let m4 = self.values.iter().map(|d| d.powi(4)).sum::<f64>();
        self.n() * m4 / (self.sum_sq * self.sum_sq)
    }
}

/// Rejects a variance that cannot yield a z-score.
pub(crate) fn checked_variance(variance: f64) -> Result<f64> {
    if variance.is_nan() || variance <= 0.0 {
        return Err(Error::DegenerateVariance(variance));
    }
    Ok(variance)
}

pub(crate) fn require_randomisation_size(n: usize) -> Result<()> {
    if n < 4 {
        return Err(Error::InsufficientData {
            required: 4,
            actual: n,
        });
    }
    Ok(())
}
