//! # Closed-form one-sample tests
//!
//! Parametric (t, z), binomial and rank-based primitives used by the mean-test
//! dispatcher. Every function takes a finite sample and returns an `anyhow::Result`
//! so that precondition failures reach the caller unmodified.

mod binomial;
mod rank;

pub use binomial::{binomial_test, proportion_confint, ProportionInterval};
pub use rank::{sign_test, wilcoxon_signed_rank};

use crate::statistics::{Alternative, HypothesisError, TestResult};
use crate::utils::{require_finite, require_len, SampleMoments};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// p-value of a statistic whose null distribution is described by `cdf`/`sf`.
pub(crate) fn tail_p_value(
    statistic: f64,
    alternative: Alternative,
    cdf: impl Fn(f64) -> f64,
    sf: impl Fn(f64) -> f64,
) -> f64 {
    let p = match alternative {
        Alternative::TwoSided => 2.0 * sf(statistic.abs()),
        Alternative::Less => cdf(statistic),
        Alternative::Greater => sf(statistic),
    };
    p.clamp(0.0, 1.0)
}

pub(crate) fn standard_normal() -> anyhow::Result<Normal> {
    Ok(Normal::new(0.0, 1.0)?)
}

/// One-sample Student's t-test of `H0: mean == m`.
///
/// t = (x̄ - m) / (s / √n) with `s` the sample standard deviation, df = n - 1.
pub fn one_sample_t_test(
    sample: &[f64],
    m: f64,
    alternative: Alternative,
) -> anyhow::Result<TestResult> {
    require_len(sample, 2)?;
    require_finite(sample)?;

    let n = sample.len() as f64;
    let mean = sample.mean_value().ok_or(HypothesisError::EmptySample)?;
    let sd = sample
        .std_sample()
        .ok_or(HypothesisError::InsufficientSampleSize {
            given: sample.len(),
            needed: 2,
        })?;
    if sd == 0.0 {
        return Err(HypothesisError::ZeroVariance.into());
    }

    let t = (mean - m) / (sd / n.sqrt());
    let dist = StudentsT::new(0.0, 1.0, n - 1.0)?;
    let p = tail_p_value(t, alternative, |x| dist.cdf(x), |x| dist.sf(x));

    Ok(TestResult::new(t, p))
}

/// One-sample z-test with a known population standard deviation.
///
/// Follows the dispatcher's convention z = (x̄ - m) / σ; the statistic is not scaled
/// by √n.
pub fn z_test(
    sample: &[f64],
    m: f64,
    known_sd: f64,
    alternative: Alternative,
) -> anyhow::Result<TestResult> {
    require_len(sample, 1)?;
    require_finite(sample)?;
    if !(known_sd > 0.0) || !known_sd.is_finite() {
        anyhow::bail!("Known standard deviation must be positive and finite, got {}", known_sd);
    }

    let mean = sample.mean_value().ok_or(HypothesisError::EmptySample)?;
    let z = (mean - m) / known_sd;
    let normal = standard_normal()?;
    let p = tail_p_value(z, alternative, |x| normal.cdf(x), |x| normal.sf(x));

    Ok(TestResult::new(z, p))
}

/// Two-sided t-based confidence interval for the mean at level `1 - alpha`.
pub fn mean_confint(sample: &[f64], alpha: f64) -> anyhow::Result<(f64, f64)> {
    crate::statistics::require_alpha(alpha)?;
    require_len(sample, 2)?;
    require_finite(sample)?;

    let n = sample.len() as f64;
    let mean = sample.mean_value().ok_or(HypothesisError::EmptySample)?;
    let sd = sample.std_sample().unwrap_or(0.0);
    let dist = StudentsT::new(0.0, 1.0, n - 1.0)?;
    let half_width = dist.inverse_cdf(1.0 - alpha / 2.0) * sd / n.sqrt();

    Ok((mean - half_width, mean + half_width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_t_test_matches_reference() {
        // scipy.stats.ttest_1samp([5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9], 5.0)
        let data = [5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9];
        let r = one_sample_t_test(&data, 5.0, Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 0.6294651817966841, epsilon = 1e-9);
        assert!(r.p_value > 0.5 && r.p_value < 0.6, "p = {}", r.p_value);
    }

    #[test]
    fn test_t_test_alternatives() {
        let data = [2.0, 4.0, 6.0, 8.0, 10.0];
        let two = one_sample_t_test(&data, 3.0, Alternative::TwoSided).unwrap();
        let greater = one_sample_t_test(&data, 3.0, Alternative::Greater).unwrap();
        let less = one_sample_t_test(&data, 3.0, Alternative::Less).unwrap();

        assert!(two.statistic > 0.0);
        assert_relative_eq!(greater.p_value * 2.0, two.p_value, epsilon = 1e-12);
        assert_relative_eq!(greater.p_value + less.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_t_test_errors() {
        assert!(one_sample_t_test(&[1.0], 0.0, Alternative::TwoSided).is_err());
        let err = one_sample_t_test(&[2.0, 2.0, 2.0], 1.0, Alternative::TwoSided).unwrap_err();
        assert_eq!(
            err.downcast_ref::<HypothesisError>(),
            Some(&HypothesisError::ZeroVariance)
        );
    }

    #[test]
    fn test_z_test() {
        let data = [1.0, 2.0, 3.0];
        let r = z_test(&data, 2.0, 1.0, Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 1.0);

        let r = z_test(&data, 0.04, 1.0, Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 1.96, epsilon = 1e-12);
        assert_relative_eq!(r.p_value, 0.04999579, epsilon = 1e-6);

        assert!(z_test(&data, 0.0, 0.0, Alternative::TwoSided).is_err());
        assert!(z_test(&data, 0.0, -1.0, Alternative::TwoSided).is_err());
    }

    #[test]
    fn test_mean_confint_contains_mean() {
        let data = [5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9];
        let (low, high) = mean_confint(&data, 0.05).unwrap();
        let mean = data.mean_value().unwrap();
        assert!(low < mean && mean < high);
        assert_relative_eq!(mean - low, high - mean, epsilon = 1e-12);
    }
}
