use std::f64::consts::SQRT_2;

use super::Alternative;

/// Complementary error function, Abramowitz & Stegun 7.1.26 (error < 1.5e-7).
fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    poly * (-x * x).exp()
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// `P(Z > z)`, computed without cancellation in the upper tail.
pub fn upper_tail(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

/// p-value of a standard deviate whose positive side is positive autocorrelation.
pub fn p_value(z: f64, alternative: Alternative) -> f64 {
    match alternative {
        Alternative::Greater => upper_tail(z),
        Alternative::Less => normal_cdf(z),
        Alternative::TwoSided => (2.0 * upper_tail(z.abs())).min(1.0),
    }
}
