// Royston (1992, 1995) approximation of the Shapiro-Wilk W test, Algorithm AS R94.
use crate::statistics::inference::standard_normal;
use crate::statistics::{HypothesisError, TestResult};
use crate::utils::{require_finite, require_len, sorted};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

// Above this size the Royston p-value approximation is no longer validated.
const SHAPIRO_MAX_VALIDATED: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &coef| acc * x + coef)
}

/// Shapiro-Wilk test of `H0: the sample is drawn from a normal distribution`.
///
/// Requires at least three observations with a non-zero range. Samples above 5000
/// observations are evaluated but the p-value may be inaccurate.
pub fn shapiro_wilk(sample: &[f64]) -> anyhow::Result<TestResult> {
    require_len(sample, 3)?;
    require_finite(sample)?;

    let n = sample.len();
    if n > SHAPIRO_MAX_VALIDATED {
        log::warn!(
            "Shapiro-Wilk p-value may be inaccurate for n = {} > {}",
            n,
            SHAPIRO_MAX_VALIDATED
        );
    }

    let x = sorted(sample);
    if x[n - 1] - x[0] <= 0.0 {
        return Err(HypothesisError::ZeroVariance.into());
    }

    if n == 3 {
        let mean = x.iter().sum::<f64>() / 3.0;
        let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
        let numerator = FRAC_1_SQRT_2 * (x[2] - x[0]);
        let w = (numerator * numerator / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / PI) * w.sqrt().acos();
        return Ok(TestResult::new(w, p));
    }

    let normal = standard_normal()?;
    let a = coefficients(n, &normal)?;

    let half = n / 2;
    let sa: f64 = (0..half).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    let w = (sa * sa / ss).min(1.0);

    Ok(TestResult::new(w, p_value(w, n, &normal)))
}

fn coefficients(n: usize, normal: &Normal) -> anyhow::Result<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    let m: Vec<f64> = (0..half)
        .map(|i| -normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; half];
    a[0] = poly(&C1, rsn) + m[0] / ssumm2;

    let (corrected, fac) = if n <= 5 {
        let fac_sq = summ2 - 2.0 * m[0] * m[0];
        let one_minus = 1.0 - 2.0 * a[0] * a[0];
        (1, (fac_sq / one_minus).sqrt())
    } else {
        a[1] = m[1] / ssumm2 + poly(&C2, rsn);
        let fac_sq = summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1];
        let one_minus = 1.0 - 2.0 * a[0] * a[0] - 2.0 * a[1] * a[1];
        (2, (fac_sq / one_minus).sqrt())
    };
    if !fac.is_finite() || fac <= 0.0 {
        anyhow::bail!("Shapiro-Wilk coefficients are undefined for n = {}", n);
    }

    for i in corrected..half {
        a[i] = m[i] / fac;
    }
    Ok(a)
}

fn p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();
    let nf = n as f64;

    if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let mu = poly(&C3, nf);
        let sigma = poly(&C4, nf).exp();
        normal.sf((y2 - mu) / sigma)
    } else {
        let ln_n = nf.ln();
        let mu = poly(&C5, ln_n);
        let sigma = poly(&C6, ln_n).exp();
        normal.sf((y - mu) / sigma)
    }
}
