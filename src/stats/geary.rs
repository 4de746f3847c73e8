//! Global Geary's C
//!
//! `C = ((n - 1) / (2 S0)) · Σ_i Σ_j w_ij (y_i - y_j)² / Σ dy²`. C is below 1
//! for positive spatial autocorrelation and above 1 for negative.

use rand::Rng;
use tracing::debug;

use super::permutation::{self, MonteCarloConfig, PermutationTest, Tail};
use super::{
    checked_variance, require_randomisation_size, AnalyticConfig, AnalyticTest, Deviations,
};
use crate::error::Result;
use crate::weights::WeightMatrix;

/// Result of a Geary's C computation
#[derive(Debug, Clone, PartialEq)]
pub struct GearyResult {
    pub c: f64,
    /// Always 1 under no spatial autocorrelation
    pub expected: f64,
    pub analytic: Option<AnalyticTest>,
    pub monte_carlo: Option<PermutationTest>,
}

// 偏差の差は値の差に等しい
fn squared_differences(w: &WeightMatrix, deviations: &[f64]) -> f64 {
    w.rows()
        .zip(deviations)
        .map(|(row, &di)| {
            row.iter()
                .zip(deviations)
                .map(|(wij, dj)| wij * (di - dj) * (di - dj))
                .sum::<f64>()
        })
        .sum()
}

fn statistic(w: &WeightMatrix, deviations: &[f64], sum_sq: f64) -> f64 {
    let n = deviations.len() as f64;
    ((n - 1.0) / (2.0 * w.s0())) * squared_differences(w, deviations) / sum_sq
}

fn observed(values: &[f64], w: &WeightMatrix) -> Result<(Deviations, GearyResult)> {
    let dev = Deviations::new(values, w)?;
    let c = statistic(w, &dev.values, dev.sum_sq);
    Ok((
        dev,
        GearyResult {
            c,
            expected: 1.0,
            analytic: None,
            monte_carlo: None,
        },
    ))
}

/// Computes Geary's C. Same preconditions and errors as [`super::moran_i`].
pub fn geary_c(values: &[f64], w: &WeightMatrix) -> Result<GearyResult> {
    observed(values, w).map(|(_, result)| result)
}

/// Geary's C with the closed-form test.
///
/// The z-score is `(1 - C) / sd`, so a positive value signals positive
/// autocorrelation as it does for Moran's I.
pub fn geary_test(
    values: &[f64],
    w: &WeightMatrix,
    config: &AnalyticConfig,
) -> Result<GearyResult> {
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
        let a = (n - 1.0) * s1 * (nn - 3.0 * n + 3.0 - (n - 1.0) * k);
        let b = 0.25 * (n - 1.0) * s2 * (nn + 3.0 * n - 6.0 - (nn - n + 2.0) * k);
        let c = s02 * (nn - 3.0 - (n - 1.0) * (n - 1.0) * k);
        (a - b + c) / (n * (n - 2.0) * (n - 3.0) * s02)
    } else {
        ((2.0 * s1 + s2) * (n - 1.0) - 4.0 * s02) / (2.0 * (n + 1.0) * s02)
    };
    let variance = checked_variance(raw)?;
    let z_score = (result.expected - result.c) / variance.sqrt();

    debug!(
        "Geary's C = {:.6}, Var = {:.6}, z = {:.4}",
        result.c, variance, z_score
    );

    result.analytic = Some(AnalyticTest::new(z_score, variance, config));
    Ok(result)
}

/// Geary's C with a Monte Carlo permutation test.
///
/// Positive autocorrelation lies in the lower tail, so under
/// [`super::Alternative::Greater`] simulated values at or below the observed C
/// are counted.
pub fn geary_mc<R>(
    values: &[f64],
    w: &WeightMatrix,
    config: &MonteCarloConfig,
    rng: &mut R,
) -> Result<GearyResult>
where
    R: Rng + ?Sized,
{
    let (dev, mut result) = observed(values, w)?;
    let sum_sq = dev.sum_sq;
    let test = permutation::run(result.c, &dev.values, config, Tail::Lower, rng, |d| {
        statistic(w, d, sum_sq)
    })?;
    result.monte_carlo = Some(test);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::graph::{Contiguity, NeighborGraph};
    use crate::stats::Alternative;
    use crate::weights::Style;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const VALUES: [f64; 5] = [10.0, 6.0, 4.0, 11.0, 6.0];

    fn worked_example(style: Style) -> WeightMatrix {
        let graph = NeighborGraph::from_edges(
            5,
            [(0, 1), (0, 3), (1, 2), (1, 3), (1, 4), (2, 3), (3, 4)],
        )
        .unwrap();
        WeightMatrix::derive(&graph, style)
    }

    fn clustered_grid() -> (Vec<f64>, WeightMatrix) {
        let graph = NeighborGraph::grid(10, 10, Contiguity::Queen);
        let values = (0..100)
            .map(|k| if k % 10 < 5 { 0.0 } else { 100.0 })
            .collect();
        (values, WeightMatrix::derive(&graph, Style::RowStandardized))
    }

    #[test]
    fn test_worked_example() {
        let result = geary_c(&VALUES, &worked_example(Style::Binary)).unwrap();
        // 両方向で Σ w_ij (y_i - y_j)² = 240
        let expected_c = (4.0 * 240.0) / (2.0 * 14.0 * 35.2);
        assert!((result.c - expected_c).abs() < 1e-12, "C = {}", result.c);
        assert_eq!(result.expected, 1.0);
    }

    #[test]
    fn test_shares_preconditions_with_moran() {
        let w = worked_example(Style::Binary);
        assert!(matches!(
            geary_c(&[1.0, 2.0], &w),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(geary_c(&[4.0; 5], &w), Err(Error::ZeroVariance)));
    }

    #[test]
    fn test_clustered_grid_below_one() {
        let (values, w) = clustered_grid();
        let result = geary_test(&values, &w, &AnalyticConfig::default()).unwrap();
        assert!(result.c < 0.5, "clustered grid C = {}", result.c);
        let test = result.analytic.unwrap();
        assert!(test.z_score > 3.0, "z = {}", test.z_score);
        assert!(test.p_value < 0.01);
    }

    #[test]
    fn test_normality_variance() {
        let w = worked_example(Style::Binary);
        let config = AnalyticConfig {
            randomisation: false,
            alternative: Alternative::TwoSided,
        };
        let result = geary_test(&VALUES, &w, &config).unwrap();
        // ((2·28 + 176)·4 − 4·196) / (2·6·196)
        let variance = (232.0 * 4.0 - 784.0) / (12.0 * 196.0);
        let test = result.analytic.unwrap();
        assert!((test.variance - variance).abs() < 1e-12);
        assert!((test.z_score - (1.0 - result.c) / variance.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_randomisation_variance_is_positive() {
        let result = geary_test(&VALUES, &worked_example(Style::Binary), &AnalyticConfig::default())
            .unwrap();
        assert!(result.analytic.unwrap().variance > 0.0);
    }

    #[test]
    fn test_monte_carlo_lower_tail() {
        let (values, w) = clustered_grid();
        let mut rng = StdRng::seed_from_u64(11);
        let result = geary_mc(&values, &w, &MonteCarloConfig::default(), &mut rng).unwrap();
        let test = result.monte_carlo.unwrap();
        assert_eq!(test.simulated.len(), 99);
        assert!(test.simulated.iter().all(|&s| s > result.c));
        assert!((test.p_value - 0.01).abs() < 1e-12);
    }
}
