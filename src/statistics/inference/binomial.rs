use crate::statistics::{require_alpha, Alternative, HypothesisError};
use statrs::distribution::{Beta, Binomial, ContinuousCDF, Discrete};

use super::standard_normal;

// Relative tolerance when collecting outcomes "as extreme" as the observed one.
const TWO_SIDED_RTOL: f64 = 1.0 + 1e-7;

/// Confidence interval construction for a binomial proportion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProportionInterval {
    /// Wald interval, clipped to `[0, 1]`.
    Normal,
    #[default]
    Wilson,
    /// Exact interval from beta quantiles.
    ClopperPearson,
}

fn binomial_pmf(trials: u64, p: f64) -> anyhow::Result<Box<dyn Fn(u64) -> f64>> {
    if p == 0.0 {
        return Ok(Box::new(|k| if k == 0 { 1.0 } else { 0.0 }));
    }
    if p == 1.0 {
        return Ok(Box::new(move |k| if k == trials { 1.0 } else { 0.0 }));
    }
    let dist = Binomial::new(p, trials)?;
    Ok(Box::new(move |k| dist.pmf(k)))
}

/// Exact binomial test of `H0: P(success) == p` given `successes` out of `trials`.
///
/// The two-sided p-value sums the probability of every outcome no more likely than
/// the observed one.
pub fn binomial_test(
    successes: u64,
    trials: u64,
    p: f64,
    alternative: Alternative,
) -> anyhow::Result<f64> {
    if trials == 0 {
        return Err(HypothesisError::InsufficientSampleSize { given: 0, needed: 1 }.into());
    }
    if successes > trials {
        anyhow::bail!(
            "Number of successes ({}) exceeds number of trials ({})",
            successes,
            trials
        );
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(HypothesisError::InvalidProbability(p).into());
    }

    let pmf = binomial_pmf(trials, p)?;
    let p_value = match alternative {
        Alternative::Less => (0..=successes).map(|k| pmf(k)).sum::<f64>(),
        Alternative::Greater => (successes..=trials).map(|k| pmf(k)).sum::<f64>(),
        Alternative::TwoSided => {
            let observed = pmf(successes) * TWO_SIDED_RTOL;
            (0..=trials)
                .map(|k| pmf(k))
                .filter(|&prob| prob <= observed)
                .sum::<f64>()
        }
    };

    Ok(p_value.clamp(0.0, 1.0))
}

/// Two-sided confidence interval for a proportion at level `1 - alpha`.
pub fn proportion_confint(
    successes: u64,
    trials: u64,
    alpha: f64,
    method: ProportionInterval,
) -> anyhow::Result<(f64, f64)> {
    require_alpha(alpha)?;
    if trials == 0 {
        return Err(HypothesisError::InsufficientSampleSize { given: 0, needed: 1 }.into());
    }
    if successes > trials {
        anyhow::bail!(
            "Number of successes ({}) exceeds number of trials ({})",
            successes,
            trials
        );
    }

    let n = trials as f64;
    let k = successes as f64;
    let p_hat = k / n;
    let z = standard_normal()?.inverse_cdf(1.0 - alpha / 2.0);

    let interval = match method {
        ProportionInterval::Normal => {
            let half_width = z * (p_hat * (1.0 - p_hat) / n).sqrt();
            (p_hat - half_width, p_hat + half_width)
        }
        ProportionInterval::Wilson => {
            let z2 = z * z;
            let denom = 1.0 + z2 / n;
            let center = (p_hat + z2 / (2.0 * n)) / denom;
            let half_width = z * (p_hat * (1.0 - p_hat) / n + z2 / (4.0 * n * n)).sqrt() / denom;
            (center - half_width, center + half_width)
        }
        ProportionInterval::ClopperPearson => {
            let low = if successes == 0 {
                0.0
            } else {
                Beta::new(k, n - k + 1.0)?.inverse_cdf(alpha / 2.0)
            };
            let high = if successes == trials {
                1.0
            } else {
                Beta::new(k + 1.0, n - k)?.inverse_cdf(1.0 - alpha / 2.0)
            };
            (low, high)
        }
    };

    Ok((interval.0.max(0.0), interval.1.min(1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_sided_symmetric() {
        // P(X <= 1) + P(X >= 9) for Bin(10, 0.5)
        let p = binomial_test(1, 10, 0.5, Alternative::TwoSided).unwrap();
        assert_relative_eq!(p, 22.0 / 1024.0, epsilon = 1e-12);

        let p = binomial_test(5, 10, 0.5, Alternative::TwoSided).unwrap();
        assert_relative_eq!(p, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_one_sided() {
        let less = binomial_test(2, 10, 0.5, Alternative::Less).unwrap();
        assert_relative_eq!(less, 56.0 / 1024.0, epsilon = 1e-12);

        let greater = binomial_test(8, 10, 0.5, Alternative::Greater).unwrap();
        assert_relative_eq!(greater, 56.0 / 1024.0, epsilon = 1e-12);

        let greater = binomial_test(0, 10, 0.3, Alternative::Greater).unwrap();
        assert_relative_eq!(greater, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_boundary_probabilities() {
        assert_relative_eq!(
            binomial_test(1000, 1000, 1.0, Alternative::TwoSided).unwrap(),
            1.0
        );
        assert_relative_eq!(
            binomial_test(999, 1000, 1.0, Alternative::TwoSided).unwrap(),
            0.0
        );
        assert_relative_eq!(binomial_test(0, 5, 0.0, Alternative::TwoSided).unwrap(), 1.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(binomial_test(3, 2, 0.5, Alternative::TwoSided).is_err());
        assert!(binomial_test(0, 0, 0.5, Alternative::TwoSided).is_err());

        let err = binomial_test(1, 2, 1.5, Alternative::TwoSided).unwrap_err();
        assert_eq!(
            err.downcast_ref::<HypothesisError>(),
            Some(&HypothesisError::InvalidProbability(1.5))
        );
    }

    #[test]
    fn test_confidence_intervals_contain_estimate() {
        for method in [
            ProportionInterval::Normal,
            ProportionInterval::Wilson,
            ProportionInterval::ClopperPearson,
        ] {
            let (low, high) = proportion_confint(5, 7, 0.05, method).unwrap();
            assert!(low < 5.0 / 7.0 && 5.0 / 7.0 < high, "{:?}: ({}, {})", method, low, high);
            assert!((0.0..=1.0).contains(&low) && (0.0..=1.0).contains(&high));
        }

        let (low, high) = proportion_confint(0, 10, 0.05, ProportionInterval::ClopperPearson).unwrap();
        assert_relative_eq!(low, 0.0);
        assert_relative_eq!(high, 1.0 - 0.025f64.powf(0.1), epsilon = 1e-6);
    }
}
