//! # Sign-flip permutation test
//!
//! One-sample location test that makes no distributional assumption beyond symmetry
//! about the hypothesized mean. Under the null every observation is equally likely
//! to lie above or below `m`, so flipping the signs of the centered observations
//! produces the null distribution of their sum.
//!
//! ## Modes
//! - **Exact**: every one of the `2^n` sign assignments is enumerated. This costs
//!   `O(n * 2^n)` time and `O(2^n)` memory and is refused above
//!   [`EXACT_SAMPLE_CEILING`] observations.
//! - **Monte Carlo**: `max_permutations` random assignments drawn from a seeded
//!   ChaCha generator, deduplicated. The all-positive assignment is always included
//!   so the observed statistic belongs to the distribution.

use crate::statistics::{Alternative, HypothesisError};
use crate::utils::require_finite;
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Largest sample enumerated exhaustively (2^20 assignments).
pub const EXACT_SAMPLE_CEILING: usize = 20;

/// Draws used when Monte Carlo mode is selected without an explicit count.
pub const DEFAULT_MONTE_CARLO_DRAWS: usize = 10_000;

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationMode {
    Exact,
    MonteCarlo { draws: usize, seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationOptions {
    /// `None` enumerates every sign assignment.
    pub max_permutations: Option<usize>,
    pub alternative: Alternative,
    pub seed: u64,
}

impl Default for PermutationOptions {
    fn default() -> Self {
        Self {
            max_permutations: None,
            alternative: Alternative::TwoSided,
            seed: DEFAULT_SEED,
        }
    }
}

impl PermutationOptions {
    pub fn max_permutations(mut self, max_permutations: usize) -> Self {
        self.max_permutations = Some(max_permutations);
        self
    }

    pub fn alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn mode(&self) -> PermutationMode {
        match self.max_permutations {
            None => PermutationMode::Exact,
            Some(draws) => PermutationMode::MonteCarlo {
                draws,
                seed: self.seed,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermutationOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub distribution_size: usize,
    pub mode: PermutationMode,
}

pub struct PermutationTest {
    centered: Array1<f64>,
    options: PermutationOptions,
}

impl PermutationTest {
    pub fn new(sample: &[f64], m: f64, options: PermutationOptions) -> anyhow::Result<Self> {
        if sample.is_empty() {
            return Err(HypothesisError::EmptySample.into());
        }
        require_finite(sample)?;
        if !m.is_finite() {
            anyhow::bail!("Hypothesized mean must be finite, got {}", m);
        }

        let n = sample.len();
        match options.max_permutations {
            None if n > EXACT_SAMPLE_CEILING => {
                return Err(HypothesisError::ExactEnumerationTooLarge {
                    n,
                    ceiling: EXACT_SAMPLE_CEILING,
                }
                .into());
            }
            Some(0) => anyhow::bail!("max_permutations must be positive"),
            _ => {}
        }

        let centered = Array1::from_iter(sample.iter().map(|&x| x - m));
        Ok(Self { centered, options })
    }

    /// Sum of the centered sample, i.e. the all-positive sign assignment.
    pub fn observed_statistic(&self) -> f64 {
        Array1::<f64>::ones(self.centered.len()).dot(&self.centered)
    }

    /// Statistic values over the enumerated or sampled sign assignments.
    pub fn null_distribution(&self) -> Vec<f64> {
        match self.options.mode() {
            PermutationMode::Exact => self.exact_distribution(),
            PermutationMode::MonteCarlo { draws, seed } => self.sampled_distribution(draws, seed),
        }
    }

    fn exact_distribution(&self) -> Vec<f64> {
        let n = self.centered.len();
        let total = 1usize << n;
        let mut signs = Array1::<f64>::ones(n);
        let mut distribution = Vec::with_capacity(total);

        // Bit i of the mask set means observation i is negated; mask 0 is the identity.
        for mask in 0..total {
            for (i, sign) in signs.iter_mut().enumerate() {
                *sign = if (mask >> i) & 1 == 1 { -1.0 } else { 1.0 };
            }
            distribution.push(signs.dot(&self.centered));
        }
        distribution
    }

    fn sampled_distribution(&self, draws: usize, seed: u64) -> Vec<f64> {
        let n = self.centered.len();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut seen: HashSet<Vec<i8>> = HashSet::with_capacity(draws + 1);
        let mut distribution = Vec::with_capacity(draws + 1);

        seen.insert(vec![1i8; n]);
        distribution.push(self.observed_statistic());

        let mut signs = Array1::<f64>::ones(n);
        for _ in 0..draws {
            let assignment: Vec<i8> = (0..n)
                .map(|_| if rng.random::<bool>() { 1 } else { -1 })
                .collect();
            for (sign, &s) in signs.iter_mut().zip(assignment.iter()) {
                *sign = f64::from(s);
            }
            if seen.insert(assignment) {
                distribution.push(signs.dot(&self.centered));
            }
        }
        distribution
    }

    pub fn run(&self) -> PermutationOutcome {
        let observed = self.observed_statistic();
        let distribution = self.null_distribution();
        let p_value = empirical_p_value(&distribution, observed, self.options.alternative);

        PermutationOutcome {
            statistic: observed,
            p_value,
            distribution_size: distribution.len(),
            mode: self.options.mode(),
        }
    }
}

/// Fraction of `distribution` at least as extreme as `observed`.
pub fn empirical_p_value(distribution: &[f64], observed: f64, alternative: Alternative) -> f64 {
    if distribution.is_empty() {
        return 1.0;
    }
    let extreme = match alternative {
        Alternative::TwoSided => distribution
            .iter()
            .filter(|v| v.abs() >= observed.abs())
            .count(),
        Alternative::Less => distribution.iter().filter(|&&v| v <= observed).count(),
        Alternative::Greater => distribution.iter().filter(|&&v| v >= observed).count(),
    };
    extreme as f64 / distribution.len() as f64
}

/// One-sample sign-flip permutation test of `H0: mean == m`.
pub fn permutation_test(
    sample: &[f64],
    m: f64,
    options: &PermutationOptions,
) -> anyhow::Result<PermutationOutcome> {
    Ok(PermutationTest::new(sample, m, *options)?.run())
}
