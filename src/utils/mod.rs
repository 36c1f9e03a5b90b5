use crate::statistics::HypothesisError;
use ndarray::ArrayView1;
use std::cmp::Ordering;

/// Moment helpers for one-dimensional samples.
pub trait SampleMoments {
    fn mean_value(&self) -> Option<f64>;

    /// Standard deviation with `ddof = 0`.
    fn std_population(&self) -> Option<f64>;

    /// Standard deviation with `ddof = 1`. `None` below two observations.
    fn std_sample(&self) -> Option<f64>;

    /// `(x - mean) / std_population`, or `None` when the sample is empty or constant.
    fn standardized(&self) -> Option<Vec<f64>>;
}

impl SampleMoments for [f64] {
    fn mean_value(&self) -> Option<f64> {
        ArrayView1::from(self).mean()
    }

    fn std_population(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(ArrayView1::from(self).std(0.0))
    }

    fn std_sample(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        Some(ArrayView1::from(self).std(1.0))
    }

    fn standardized(&self) -> Option<Vec<f64>> {
        let mean = self.mean_value()?;
        let std = self.std_population()?;
        if std == 0.0 {
            return None;
        }
        Some(self.iter().map(|&x| (x - mean) / std).collect())
    }
}

/// Level for the human-readable trace: `Info` when verbose, `Debug` otherwise.
pub(crate) fn trace_level(verbose: bool) -> log::Level {
    if verbose {
        log::Level::Info
    } else {
        log::Level::Debug
    }
}

pub(crate) fn require_finite(sample: &[f64]) -> anyhow::Result<()> {
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(HypothesisError::NonFiniteSample.into());
    }
    Ok(())
}

pub(crate) fn require_len(sample: &[f64], needed: usize) -> anyhow::Result<()> {
    if sample.len() < needed {
        return Err(HypothesisError::InsufficientSampleSize {
            given: sample.len(),
            needed,
        }
        .into());
    }
    Ok(())
}

pub(crate) fn sorted(sample: &[f64]) -> Vec<f64> {
    let mut values = sample.to_vec();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values
}

/// Average ranks (1-based) for values already sorted ascending. Ties share the mean rank.
pub(crate) fn average_ranks(sorted_values: &[f64]) -> Vec<f64> {
    let n = sorted_values.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted_values[j] == sorted_values[i] {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j).skip(i) {
            *rank = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Sum of t(t² - 1) over tie groups of a sorted slice, plus whether any tie exists.
pub(crate) fn tie_correction(sorted_values: &[f64]) -> (f64, bool) {
    let n = sorted_values.len();
    let mut correction = 0.0;
    let mut has_ties = false;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted_values[j] == sorted_values[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            has_ties = true;
            correction += t * (t * t - 1.0);
        }
        i = j;
    }
    (correction, has_ties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_moments() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        assert_relative_eq!(data.mean_value().unwrap(), 5.0);
        assert_relative_eq!(data.std_population().unwrap(), 2.0);
        assert_relative_eq!(data.std_sample().unwrap(), (32.0f64 / 7.0).sqrt());

        let z = data.standardized().unwrap();
        assert_relative_eq!(z[0], -1.5);
        assert_relative_eq!(z.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_moments() {
        let empty: [f64; 0] = [];
        assert!(empty.mean_value().is_none());
        assert!(empty.std_population().is_none());
        assert!([3.0].std_sample().is_none());
        assert!([1.5, 1.5, 1.5].standardized().is_none());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 5.0, 5.0, 5.0]);

        let (correction, has_ties) = tie_correction(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert!(has_ties);
        assert_relative_eq!(correction, 6.0 + 24.0);

        let (_, has_ties) = tie_correction(&[1.0, 2.0, 3.0]);
        assert!(!has_ties);
    }

    #[test]
    fn test_validation() {
        assert!(require_finite(&[1.0, f64::NAN]).is_err());
        assert!(require_finite(&[1.0, f64::INFINITY]).is_err());
        assert!(require_finite(&[1.0, 2.0]).is_ok());

        let err = require_len(&[1.0], 3).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HypothesisError>(),
            Some(HypothesisError::InsufficientSampleSize { given: 1, needed: 3 })
        ));
    }
}
