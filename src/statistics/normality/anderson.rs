use crate::statistics::inference::standard_normal;
use crate::statistics::HypothesisError;
use crate::utils::{require_finite, require_len, sorted, SampleMoments};
use statrs::distribution::ContinuousCDF;

/// Asymptotic critical values of A² for a normal with estimated mean and variance.
const NORMAL_CRITICAL: [f64; 5] = [0.576, 0.656, 0.787, 0.918, 1.092];

/// Significance levels, in percent, matching [`NORMAL_CRITICAL`].
pub const SIGNIFICANCE_LEVELS: [f64; 5] = [15.0, 10.0, 5.0, 2.5, 1.0];

/// Anderson-Darling statistic together with its critical-value table.
#[derive(Debug, Clone, PartialEq)]
pub struct AndersonResult {
    pub statistic: f64,
    pub critical_values: Vec<f64>,
    pub significance_levels: Vec<f64>,
}

impl AndersonResult {
    /// Number of critical values the statistic meets or exceeds.
    pub fn exceedances(&self) -> usize {
        self.critical_values
            .iter()
            .filter(|&&cv| self.statistic >= cv)
            .count()
    }
}

/// Anderson-Darling test for normality with parameters estimated from the sample.
///
/// The critical values are the Stephens (1974) table adjusted for sample size,
/// rounded to three decimals.
pub fn anderson_darling(sample: &[f64]) -> anyhow::Result<AndersonResult> {
    require_len(sample, 2)?;
    require_finite(sample)?;

    let mean = sample.mean_value().ok_or(HypothesisError::EmptySample)?;
    let sd = sample.std_sample().unwrap_or(0.0);
    if sd == 0.0 {
        return Err(HypothesisError::ZeroVariance.into());
    }

    let normal = standard_normal()?;
    let z: Vec<f64> = sorted(sample).iter().map(|&x| (x - mean) / sd).collect();
    let n = z.len();
    let nf = n as f64;

    let log_cdf: Vec<f64> = z.iter().map(|&v| normal.cdf(v).max(f64::MIN_POSITIVE).ln()).collect();
    let log_sf: Vec<f64> = z.iter().map(|&v| normal.sf(v).max(f64::MIN_POSITIVE).ln()).collect();

    let s: f64 = (0..n)
        .map(|i| (2.0 * (i as f64 + 1.0) - 1.0) / nf * (log_cdf[i] + log_sf[n - 1 - i]))
        .sum();
    let statistic = -nf - s;

    let scale = 1.0 + 4.0 / nf - 25.0 / (nf * nf);
    let critical_values = NORMAL_CRITICAL
        .iter()
        .map(|&cv| (cv / scale * 1000.0).round() / 1000.0)
        .collect();

    Ok(AndersonResult {
        statistic,
        critical_values,
        significance_levels: SIGNIFICANCE_LEVELS.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_sample() {
        let data = [148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0];
        let r = anderson_darling(&data).unwrap();
        assert_relative_eq!(r.statistic, 0.946771879598888, epsilon = 1e-6);
        assert_eq!(r.critical_values, vec![0.498, 0.567, 0.68, 0.793, 0.944]);
        assert_eq!(r.exceedances(), 5);
    }

    #[test]
    fn test_normal_quantiles_below_every_critical_value() {
        let normal = standard_normal().unwrap();
        let data: Vec<f64> = (0..100)
            .map(|i| normal.inverse_cdf((i as f64 + 0.5) / 100.0))
            .collect();
        let r = anderson_darling(&data).unwrap();
        assert!(r.statistic < 0.1, "A2 = {}", r.statistic);
        assert_eq!(r.exceedances(), 0);
        assert_eq!(r.significance_levels, SIGNIFICANCE_LEVELS.to_vec());
    }

    #[test]
    fn test_uniform_sample_exceeds_table() {
        let data: Vec<f64> = (0..1000).map(|i| i as f64 / 999.0).collect();
        let r = anderson_darling(&data).unwrap();
        assert!(r.statistic > 10.0, "A2 = {}", r.statistic);
        assert_eq!(r.exceedances(), 5);
    }

    #[test]
    fn test_preconditions() {
        assert!(anderson_darling(&[1.0]).is_err());
        assert!(anderson_darling(&[2.0, 2.0, 2.0]).is_err());
    }
}
