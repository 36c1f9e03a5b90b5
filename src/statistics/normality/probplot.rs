use crate::statistics::inference::standard_normal;
use crate::utils::{require_finite, require_len, sorted};
use statrs::distribution::ContinuousCDF;

/// Least-squares fit of ordered data against normal order-statistic medians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbPlotFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of the plot; close to one for normal data.
    pub r: f64,
}

// Filliben's estimate of the uniform order-statistic medians.
fn order_statistic_medians(n: usize) -> Vec<f64> {
    let nf = n as f64;
    let last = 0.5f64.powf(1.0 / nf);
    (0..n)
        .map(|i| {
            if i == 0 {
                1.0 - last
            } else if i == n - 1 {
                last
            } else {
                (i as f64 + 1.0 - 0.3175) / (nf + 0.365)
            }
        })
        .collect()
}

/// Quantile-quantile fit of the sample against the standard normal.
///
/// Returns only the fitted line; no plot is produced.
pub fn probability_plot(sample: &[f64]) -> anyhow::Result<ProbPlotFit> {
    require_len(sample, 2)?;
    require_finite(sample)?;

    let normal = standard_normal()?;
    let theoretical: Vec<f64> = order_statistic_medians(sample.len())
        .into_iter()
        .map(|p| normal.inverse_cdf(p))
        .collect();
    let ordered = sorted(sample);

    let n = ordered.len() as f64;
    let mean_x = theoretical.iter().sum::<f64>() / n;
    let mean_y = ordered.iter().sum::<f64>() / n;
    let (sxy, sxx, syy) = theoretical.iter().zip(ordered.iter()).fold(
        (0.0, 0.0, 0.0),
        |(sxy, sxx, syy), (&x, &y)| {
            let dx = x - mean_x;
            let dy = y - mean_y;
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        },
    );

    let slope = sxy / sxx;
    let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };

    Ok(ProbPlotFit {
        slope,
        intercept: mean_y - slope * mean_x,
        r,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scaled_normal_recovers_location_and_scale() {
        let normal = standard_normal().unwrap();
        let data: Vec<f64> = (0..50)
            .map(|i| 2.0 * normal.inverse_cdf((i as f64 + 0.5) / 50.0) + 3.0)
            .collect();
        let fit = probability_plot(&data).unwrap();
        assert_relative_eq!(fit.slope, 2.0473280124259383, epsilon = 1e-6);
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-9);
        assert!(fit.r > 0.999);
    }

    #[test]
    fn test_constant_sample_has_zero_correlation() {
        let fit = probability_plot(&[4.0; 10]).unwrap();
        assert_relative_eq!(fit.slope, 0.0);
        assert_relative_eq!(fit.intercept, 4.0);
        assert_relative_eq!(fit.r, 0.0);
    }
}
