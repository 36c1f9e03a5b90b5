use crate::statistics::{HypothesisError, TestResult};
use crate::utils::{require_finite, require_len, SampleMoments};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Central moments `(m2, m3, m4)` with population normalization.
fn central_moments(sample: &[f64]) -> (f64, f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.mean_value().unwrap_or(0.0);
    let (m2, m3, m4) = sample.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), &x| {
        let d = x - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    (m2 / n, m3 / n, m4 / n)
}

/// z-score of the sample skewness (D'Agostino 1970).
pub(crate) fn skew_z(sample: &[f64]) -> anyhow::Result<f64> {
    require_len(sample, 8)?;
    let (m2, m3, _) = central_moments(sample);
    if m2 == 0.0 {
        return Err(HypothesisError::ZeroVariance.into());
    }

    let n = sample.len() as f64;
    let b2 = m3 / m2.powf(1.5);
    let y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();

    Ok(delta * (y / alpha).asinh())
}

/// z-score of the sample kurtosis (Anscombe & Glynn 1983).
pub(crate) fn kurtosis_z(sample: &[f64]) -> anyhow::Result<f64> {
    require_len(sample, 5)?;
    let (m2, _, m4) = central_moments(sample);
    if m2 == 0.0 {
        return Err(HypothesisError::ZeroVariance.into());
    }

    let n = sample.len() as f64;
    let b2 = m4 / (m2 * m2);
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        anyhow::bail!("Kurtosis test is undefined for this sample");
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();

    Ok((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// D'Agostino-Pearson omnibus K² test of normality.
///
/// K² = Z(skew)² + Z(kurtosis)², compared against χ² with two degrees of freedom.
/// Requires at least eight observations.
pub fn dagostino_k2(sample: &[f64]) -> anyhow::Result<TestResult> {
    require_len(sample, 8)?;
    require_finite(sample)?;

    let zs = skew_z(sample)?;
    let zk = kurtosis_z(sample)?;
    let k2 = zs * zs + zk * zk;
    let p = ChiSquared::new(2.0)?.sf(k2);

    Ok(TestResult::new(k2, p))
}
