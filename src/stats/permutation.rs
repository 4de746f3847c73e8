use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use super::Alternative;
use crate::error::{Error, Result};

/// Settings for the Monte Carlo permutation test.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloConfig {
    /// Number of random permutations.
    pub nsim: usize,
    pub alternative: Alternative,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            nsim: 99,
            alternative: Alternative::Greater,
        }
    }
}

/// Outcome of a permutation test.
#[derive(Debug, Clone, PartialEq)]
pub struct PermutationTest {
    /// Simulated statistics in trial order.
    pub simulated: Vec<f64>,
    pub p_value: f64,
    pub alternative: Alternative,
}

/// Which tail of the statistic holds positive autocorrelation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tail {
    Upper,
    Lower,
}

impl MonteCarloConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.nsim == 0 {
            return Err(Error::InvalidParameter {
                name: "nsim",
                reason: "at least one permutation is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Evaluates `statistic` on `config.nsim` shuffles of `deviations`.
///
/// One seed per trial is drawn from `rng` up front, so the simulated sequence
/// depends only on the state of `rng` and not on how rayon schedules trials.
pub(crate) fn run<R, F>(
    observed: f64,
    deviations: &[f64],
    config: &MonteCarloConfig,
    tail: Tail,
    rng: &mut R,
    statistic: F,
) -> Result<PermutationTest>
where
    R: Rng + ?Sized,
    F: Fn(&[f64]) -> f64 + Sync + Send,
{
    config.validate()?;

    let seeds: Vec<u64> = (0..config.nsim).map(|_| rng.next_u64()).collect();
    let simulated: Vec<f64> = seeds
        .par_iter()
        .map(|&seed| {
            let mut trial_rng = StdRng::seed_from_u64(seed);
            let mut permuted = deviations.to_vec();
            permuted.shuffle(&mut trial_rng);
            statistic(&permuted)
        })
        .collect();

    let p_value = empirical_p(observed, &simulated, config.alternative, tail);
    info!(
        "Permutation test finished: {} simulations, observed = {:.6}, p = {:.4}",
        config.nsim, observed, p_value
    );

    Ok(PermutationTest {
        simulated,
        p_value,
        alternative: config.alternative,
    })
}

/// Rank-based p-value; simulated values tied with `observed` rank ahead of it.
pub(crate) fn empirical_p(
    observed: f64,
    simulated: &[f64],
    alternative: Alternative,
    tail: Tail,
) -> f64 {
    let total = (simulated.len() + 1) as f64;
    let at_least = simulated.iter().filter(|&&s| s >= observed).count();
    let at_most = simulated.iter().filter(|&&s| s <= observed).count();
    let upper = (at_least + 1) as f64 / total;
    let lower = (at_most + 1) as f64 / total;

    match (alternative, tail) {
        (Alternative::Greater, Tail::Upper) | (Alternative::Less, Tail::Lower) => upper,
        (Alternative::Greater, Tail::Lower) | (Alternative::Less, Tail::Upper) => lower,
        (Alternative::TwoSided, _) => (2.0 * upper.min(lower)).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_above_all_simulations() {
        let simulated: Vec<f64> = (0..99).map(|i| i as f64 / 100.0).collect();
        let p = empirical_p(5.0, &simulated, Alternative::Greater, Tail::Upper);
        assert!((p - 0.01).abs() < 1e-12);

        let p = empirical_p(5.0, &simulated, Alternative::Less, Tail::Upper);
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_rank_ahead_of_observed() {
        let simulated = vec![1.0, 2.0, 2.0, 3.0];
        // 同値が2つ、大きい値が1つ: (3 + 1) / 5
        let p = empirical_p(2.0, &simulated, Alternative::Greater, Tail::Upper);
        assert!((p - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_lower_tail_flips_direction() {
        let simulated = vec![0.9, 1.0, 1.1, 1.2];
        // 下側の裾では小さい値が正の自己相関
        let p = empirical_p(0.5, &simulated, Alternative::Greater, Tail::Lower);
        assert!((p - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_two_sided_is_capped() {
        let simulated = vec![1.0, 1.0, 1.0];
        let p = empirical_p(1.0, &simulated, Alternative::TwoSided, Tail::Upper);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_zero_simulations_rejected() {
        let config = MonteCarloConfig {
            nsim: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = run(0.0, &[1.0, -1.0], &config, Tail::Upper, &mut rng, |_| 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "nsim", .. }));
    }

    #[test]
    fn test_fixed_seed_reproduces_sequence() {
        let deviations = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        let statistic = |d: &[f64]| d[0] * 10.0 + d[1];
        let config = MonteCarloConfig::default();
        let simulate = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            run(0.0, &deviations, &config, Tail::Upper, &mut rng, statistic).unwrap()
        };

        let a = simulate(42);
        let b = simulate(42);
        assert_eq!(a.simulated.len(), 99);
        assert_eq!(a, b);

        let c = simulate(7);
        assert_ne!(a.simulated, c.simulated);
    }
}
