//! Shared numeric utilities for heavy-tailed search steps.
//!
//! The pollination and Lévy-swarm strategies both need Lévy-stable step
//! draws; this module implements them once: a Lanczos gamma
//! approximation, Box-Muller gaussian sampling, and the Mantegna
//! algorithm for Lévy-distributed steps.

use rand::Rng;
use std::f64::consts::PI;

/// Lanczos coefficients for g = 7, n = 9 (Numerical Recipes values).
const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Gamma function via the Lanczos approximation, with the reflection
/// formula for arguments below 1/2.
pub fn gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Γ(x)·Γ(1−x) = π / sin(πx)
        PI / ((PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut acc = LANCZOS_COEFFS[0];
        for (i, &c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
            acc += c / (x + i as f64);
        }
        let t = x + LANCZOS_G + 0.5;
        (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
    }
}

/// Standard normal draw via the Box-Muller transform.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // random_range over (0, 1]: avoid ln(0).
    let u1: f64 = 1.0 - rng.random_range(0.0..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Scale of the numerator gaussian in the Mantegna algorithm for a
/// symmetric Lévy-stable distribution with index `beta`.
pub fn mantegna_sigma(beta: f64) -> f64 {
    let num = gamma(1.0 + beta) * (PI * beta / 2.0).sin();
    let den = gamma((1.0 + beta) / 2.0) * beta * 2f64.powf((beta - 1.0) / 2.0);
    (num / den).powf(1.0 / beta)
}

/// One Lévy-distributed step with index `beta` (Mantegna, 1994).
///
/// Heavy-tailed: most draws are small, occasional draws are very large,
/// which is what lets Lévy flights escape local optima.
pub fn levy_step<R: Rng + ?Sized>(rng: &mut R, beta: f64) -> f64 {
    let sigma = mantegna_sigma(beta);
    let u = gaussian(rng) * sigma;
    let v = gaussian(rng);
    // |v| can underflow to ~0; clamp so the step stays finite.
    u / v.abs().max(1e-12).powf(1.0 / beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gamma_integer_points() {
        // Γ(n) = (n-1)!
        assert!((gamma(1.0) - 1.0).abs() < 1e-10);
        assert!((gamma(2.0) - 1.0).abs() < 1e-10);
        assert!((gamma(5.0) - 24.0).abs() < 1e-8);
        assert!((gamma(7.0) - 720.0).abs() < 1e-6);
    }

    #[test]
    fn test_gamma_half() {
        // Γ(1/2) = sqrt(π)
        assert!((gamma(0.5) - PI.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_mantegna_sigma_beta_1_5() {
        // Known value for the standard flower-pollination beta.
        let sigma = mantegna_sigma(1.5);
        assert!((sigma - 0.696_575).abs() < 1e-3, "sigma = {sigma}");
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| gaussian(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.05, "var = {var}");
    }

    #[test]
    fn test_levy_steps_finite_and_heavy_tailed() {
        let mut rng = StdRng::seed_from_u64(7);
        let steps: Vec<f64> = (0..10_000).map(|_| levy_step(&mut rng, 1.5)).collect();
        assert!(steps.iter().all(|s| s.is_finite()));
        let large = steps.iter().filter(|s| s.abs() > 3.0).count();
        // A gaussian would put ~0.3% of mass beyond 3; Lévy puts far more.
        assert!(large > 100, "only {large} large steps");
    }
}
