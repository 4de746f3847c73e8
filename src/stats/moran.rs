//! Global Moran's I
//!
//! `I = (n / Σ dy²) · (Σ_i Σ_j w_ij dy_i dy_j / S0)` with `dy` the deviations
//! from the mean, tested either in closed form (normality or randomisation
//! variance) or by Monte Carlo permutation of the values.

use rand::Rng;
use tracing::debug;

use super::permutation::{self, MonteCarloConfig, PermutationTest, Tail};
use super::{
    checked_variance, require_randomisation_size, AnalyticConfig, AnalyticTest, Deviations,
};
use crate::error::Result;
use crate::weights::WeightMatrix;

/// Result of a Moran's I computation
#[derive(Debug, Clone, PartialEq)]
pub struct MoranResult {
    /// Observed Moran's I
    pub i: f64,
    /// Expected I under no spatial autocorrelation, `-1 / (n - 1)`
    pub expected: f64,
    pub analytic: Option<AnalyticTest>,
    pub monte_carlo: Option<PermutationTest>,
}

/// Full double sum `Σ_i Σ_j w_ij dy_i dy_j`.
fn cross_product(w: &WeightMatrix, deviations: &[f64]) -> f64 {
    w.rows()
        .zip(deviations)
        .map(|(row, &di)| {
            let lagged: f64 = row.iter().zip(deviations).map(|(wij, dj)| wij * dj).sum();
            di * lagged
        })
        .sum()
}

fn statistic(w: &WeightMatrix, deviations: &[f64], sum_sq: f64) -> f64 {
    let n = deviations.len() as f64;
    (n / sum_sq) * (cross_product(w, deviations) / w.s0())
}

fn observed(values: &[f64], w: &WeightMatrix) -> Result<(Deviations, MoranResult)> {
    let dev = Deviations::new(values, w)?;
    let i = statistic(w, &dev.values, dev.sum_sq);
    let expected = -1.0 / (dev.n() - 1.0);
    Ok((
        dev,
        MoranResult {
            i,
            expected,
            analytic: None,
            monte_carlo: None,
        },
    ))
}

/// Computes Moran's I and its expectation.
///
/// # Errors
/// `DimensionMismatch`, `InsufficientData`, `NoNeighbors` or `ZeroVariance`
/// when the inputs cannot define the index.
pub fn moran_i(values: &[f64], w: &WeightMatrix) -> Result<MoranResult> {
    observed(values, w).map(|(_, result)| result)
}

/// Moran's I with the closed-form test of Cliff & Ord.
///
/// The randomisation variance needs at least 4 units.
pub fn moran_test(
    values: &[f64],
    w: &WeightMatrix,
    config: &AnalyticConfig,
) -> Result<MoranResult> {
    let (dev, mut result) = observed(values, w)?;

    let n = dev.n();
    let nn = n * n;
    let s0 = w.s0();
    let s02 = s0 * s0;
    let s1 = w.s1();
    let s2 = w.s2();

    let raw = if config.randomisation {
        require_randomisation_size(dev.values.len())?;
        let k = dev.kurtosis();
        let a = n * ((nn - 3.0 * n + 3.0) * s1 - n * s2 + 3.0 * s02);
        let b = k * ((nn - n) * s1 - 2.0 * n * s2 + 6.0 * s02);
        (a - b) / ((n - 1.0) * (n - 2.0) * (n - 3.0) * s02)
    } else {
        (nn * s1 - n * s2 + 3.0 * s02) / (s02 * (nn - 1.0))
    };
    let variance = checked_variance(raw - result.expected * result.expected)?;
    let z_score = (result.i - result.expected) / variance.sqrt();

    debug!(
        "Moran's I = {:.6}, E[I] = {:.6}, Var = {:.6}, z = {:.4}",
        result.i, result.expected, variance, z_score
    );

    result.analytic = Some(AnalyticTest::new(z_score, variance, config));
    Ok(result)
}

/// Moran's I with a Monte Carlo permutation test.
///
/// Values are shuffled across units `config.nsim` times while `w` stays fixed.
pub fn moran_mc<R>(
    values: &[f64],
    w: &WeightMatrix,
    config: &MonteCarloConfig,
    rng: &mut R,
) -> Result<MoranResult>
where
    R: Rng + ?Sized,
{
    let (dev, mut result) = observed(values, w)?;
    let sum_sq = dev.sum_sq;
    let test = permutation::run(result.i, &dev.values, config, Tail::Upper, rng, |d| {
        statistic(w, d, sum_sq)
    })?;
    result.monte_carlo = Some(test);
    Ok(result)
}
