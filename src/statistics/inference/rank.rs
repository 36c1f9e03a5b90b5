use crate::statistics::{Alternative, TestResult};
use crate::utils::{average_ranks, require_finite, tie_correction};
use statrs::distribution::ContinuousCDF;

use super::{binomial_test, standard_normal, tail_p_value};

// Largest number of non-zero differences for which the exact Wilcoxon null is used.
const WILCOXON_EXACT_MAX: usize = 50;

/// Sign test of `H0: median == m`.
///
/// Observations equal to `m` are discarded. The statistic is `M = (n_pos - n_neg) / 2`
/// and the p-value comes from the exact binomial test with `p = 0.5`. Without any
/// non-zero difference the sample carries no evidence and `p = 1`.
pub fn sign_test(sample: &[f64], m: f64, alternative: Alternative) -> anyhow::Result<TestResult> {
    require_finite(sample)?;

    let n_pos = sample.iter().filter(|&&x| x > m).count() as u64;
    let n_neg = sample.iter().filter(|&&x| x < m).count() as u64;
    let statistic = (n_pos as f64 - n_neg as f64) / 2.0;

    let trials = n_pos + n_neg;
    if trials == 0 {
        return Ok(TestResult::new(statistic, 1.0));
    }

    let p_value = binomial_test(n_pos, trials, 0.5, alternative)?;
    Ok(TestResult::new(statistic, p_value))
}

/// Wilcoxon signed-rank test on differences `d` (usually `x - m`) of `H0: median(d) == 0`.
///
/// Zero differences are dropped. The reported statistic is `min(R+, R-)` for the
/// two-sided alternative and `R+` otherwise. The p-value is exact for up to
/// 50 non-zero differences without ties, and uses the tie-corrected normal
/// approximation beyond that.
pub fn wilcoxon_signed_rank(differences: &[f64], alternative: Alternative) -> anyhow::Result<TestResult> {
    require_finite(differences)?;

    let mut nonzero: Vec<f64> = differences.iter().copied().filter(|&d| d != 0.0).collect();
    let n = nonzero.len();
    if n == 0 {
        return Ok(TestResult::new(0.0, 1.0));
    }

    nonzero.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
    let magnitudes: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);

    let r_plus: f64 = nonzero
        .iter()
        .zip(ranks.iter())
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, &r)| r)
        .sum();
    let total = (n * (n + 1)) as f64 / 2.0;
    let r_minus = total - r_plus;

    let statistic = match alternative {
        Alternative::TwoSided => r_plus.min(r_minus),
        _ => r_plus,
    };

    let (ties, has_ties) = tie_correction(&magnitudes);
    let p_value = if n <= WILCOXON_EXACT_MAX && !has_ties {
        exact_p_value(n, r_plus, alternative)
    } else {
        let nf = n as f64;
        let mean = nf * (nf + 1.0) / 4.0;
        let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - ties / 48.0;
        if variance <= 0.0 {
            1.0
        } else {
            let z = (r_plus - mean) / variance.sqrt();
            let normal = standard_normal()?;
            tail_p_value(z, alternative, |x| normal.cdf(x), |x| normal.sf(x))
        }
    };

    Ok(TestResult::new(statistic, p_value))
}

// Null distribution of R+ for ranks 1..=n: counts[s] = number of subsets summing to s.
fn exact_p_value(n: usize, r_plus: f64, alternative: Alternative) -> f64 {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }
    let total: f64 = counts.iter().sum();

    let r = r_plus.round() as usize;
    let lower = counts[..=r].iter().sum::<f64>() / total;
    let upper = counts[r..].iter().sum::<f64>() / total;

    let p = match alternative {
        Alternative::TwoSided => 2.0 * lower.min(upper),
        Alternative::Less => lower,
        Alternative::Greater => upper,
    };
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sign_test_counts() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let r = sign_test(&data, 0.0, Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 5.0);
        assert_relative_eq!(r.p_value, 2.0 / 1024.0, epsilon = 1e-12);

        // Values equal to m are discarded.
        let r = sign_test(&[3.0, 3.0, 4.0, 2.0], 3.0, Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sign_test_without_nonzero_differences() {
        let r = sign_test(&[2.5; 20], 2.5, Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_wilcoxon_exact() {
        // All five differences positive: P(R+ >= 15) = 1/32.
        let d = [1.0, 2.0, 3.0, 4.0, 5.0];
        let greater = wilcoxon_signed_rank(&d, Alternative::Greater).unwrap();
        assert_relative_eq!(greater.statistic, 15.0);
        assert_relative_eq!(greater.p_value, 1.0 / 32.0, epsilon = 1e-12);

        let two = wilcoxon_signed_rank(&d, Alternative::TwoSided).unwrap();
        assert_relative_eq!(two.statistic, 0.0);
        assert_relative_eq!(two.p_value, 2.0 / 32.0, epsilon = 1e-12);

        let less = wilcoxon_signed_rank(&d, Alternative::Less).unwrap();
        assert_relative_eq!(less.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wilcoxon_symmetric_sample() {
        let d = [-3.0, -2.0, -1.0, 1.5, 2.5, 3.5];
        let r = wilcoxon_signed_rank(&d, Alternative::TwoSided).unwrap();
        assert!(r.p_value > 0.5, "p = {}", r.p_value);
    }

    #[test]
    fn test_wilcoxon_with_ties_uses_normal_approximation() {
        let d = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, -1.0, 5.0];
        let r = wilcoxon_signed_rank(&d, Alternative::TwoSided).unwrap();
        assert!(r.p_value > 0.0 && r.p_value < 0.05, "p = {}", r.p_value);
    }

    #[test]
    fn test_wilcoxon_all_zero() {
        let r = wilcoxon_signed_rank(&[0.0; 8], Alternative::TwoSided).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_wilcoxon_rejects_non_finite() {
        assert!(wilcoxon_signed_rank(&[1.0, f64::NAN], Alternative::TwoSided).is_err());
    }
}
