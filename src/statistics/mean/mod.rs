//! # One-sample mean testing
//!
//! Picks a test for `H0: mean == m` from the shape of the sample:
//!
//! 1. Samples made only of zeros and ones are binomial. They get the exact binomial
//!    test with `p = m` and the normality voter is never consulted.
//! 2. Otherwise the normality voter decides (or `force_normal` skips it). Normal
//!    samples get a z-test when a positive standard deviation is known and a t-test
//!    otherwise.
//! 3. Everything else, constant samples included, gets the sign test, the Wilcoxon
//!    signed-rank test and the sign-flip permutation test, combined by a
//!    [`NonparametricPolicy`].

use crate::statistics::classify::{count_successes, is_binomial};
use crate::statistics::inference::{
    binomial_test, mean_confint, one_sample_t_test, proportion_confint, sign_test,
    wilcoxon_signed_rank, z_test, ProportionInterval,
};
use crate::statistics::normality::{check_normal, NormalityOptions, DEFAULT_ALPHA};
use crate::statistics::permutation::{
    permutation_test, PermutationOptions, PermutationOutcome, DEFAULT_MONTE_CARLO_DRAWS,
    DEFAULT_SEED, EXACT_SAMPLE_CEILING,
};
use crate::statistics::{require_alpha, Alternative, HypothesisError, NormalityVerdict, TestResult};
use crate::utils::{require_finite, trace_level, SampleMoments};
use std::fmt;

/// How the three nonparametric verdicts become one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonparametricPolicy {
    /// Only the permutation test decides; sign and Wilcoxon are reported.
    #[default]
    Permutation,
    /// All three tests must fail to reject.
    Unanimous,
    /// At least two of the three must fail to reject.
    Majority,
}

impl NonparametricPolicy {
    pub fn combine(&self, sign: bool, wilcoxon: bool, permutation: bool) -> bool {
        match self {
            NonparametricPolicy::Permutation => permutation,
            NonparametricPolicy::Unanimous => sign && wilcoxon && permutation,
            NonparametricPolicy::Majority => {
                [sign, wilcoxon, permutation].iter().filter(|&&v| v).count() >= 2
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametricMethod {
    ZTest,
    TTest,
}

impl fmt::Display for ParametricMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParametricMethod::ZTest => f.write_str("z-test"),
            ParametricMethod::TTest => f.write_str("t-test"),
        }
    }
}

/// Test that produced the decision, with every sub-result.
#[derive(Debug, Clone, PartialEq)]
pub enum MeanTestBranch {
    Binomial {
        successes: u64,
        trials: u64,
        p_value: f64,
        /// Wilson interval for the proportion; diagnostic only.
        confint: (f64, f64),
    },
    Parametric {
        method: ParametricMethod,
        result: TestResult,
        /// t-based interval for the mean; diagnostic only.
        confint: (f64, f64),
    },
    Nonparametric {
        sign: TestResult,
        wilcoxon: TestResult,
        permutation: PermutationOutcome,
        policy: NonparametricPolicy,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanTestOutcome {
    /// `true` when the null hypothesis is not rejected at `alpha`.
    pub accepted: bool,
    /// The sample has zero variance.
    pub degenerate: bool,
    /// `None` when the normality voter did not run.
    pub normality: Option<NormalityVerdict>,
    pub branch: MeanTestBranch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanTestOptions {
    /// Population standard deviation. Values that are not positive fall back to the t-test.
    pub known_sd: Option<f64>,
    pub alpha: f64,
    pub alternative: Alternative,
    /// Skip the normality vote and treat the sample as normal.
    pub force_normal: bool,
    /// Criteria and quorum for the normality vote. Its `alpha` is replaced by the
    /// dispatcher's and `verbose` is enabled when the dispatcher is verbose.
    pub normality: NormalityOptions,
    /// `None` enumerates every sign assignment when the sample is small enough.
    pub max_permutations: Option<usize>,
    pub seed: u64,
    pub policy: NonparametricPolicy,
    pub verbose: bool,
}

impl Default for MeanTestOptions {
    fn default() -> Self {
        Self {
            known_sd: None,
            alpha: DEFAULT_ALPHA,
            alternative: Alternative::TwoSided,
            force_normal: false,
            normality: NormalityOptions::default(),
            max_permutations: None,
            seed: DEFAULT_SEED,
            policy: NonparametricPolicy::default(),
            verbose: false,
        }
    }
}

impl MeanTestOptions {
    pub fn builder() -> MeanTestOptionsBuilder {
        MeanTestOptionsBuilder::new()
    }

    fn normality_options(&self) -> NormalityOptions {
        NormalityOptions {
            alpha: self.alpha,
            verbose: self.verbose || self.normality.verbose,
            ..self.normality.clone()
        }
    }

    /// Exact enumeration when allowed and affordable, Monte Carlo otherwise.
    fn permutation_options(&self, n: usize) -> PermutationOptions {
        let max_permutations = match self.max_permutations {
            None if n <= EXACT_SAMPLE_CEILING => None,
            other => Some(other.unwrap_or(DEFAULT_MONTE_CARLO_DRAWS)),
        };
        PermutationOptions {
            max_permutations,
            alternative: self.alternative,
            seed: self.seed,
        }
    }
}

/// Builder for [`MeanTestOptions`].
///
/// ```ignore
/// let options = MeanTestOptions::builder()
///     .alpha(0.01)
///     .alternative(Alternative::Greater)
///     .max_permutations(5_000)
///     .verbose(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeanTestOptionsBuilder {
    options: MeanTestOptions,
}

impl MeanTestOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known_sd(mut self, known_sd: f64) -> Self {
        self.options.known_sd = Some(known_sd);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.options.alpha = alpha;
        self
    }

    pub fn alternative(mut self, alternative: Alternative) -> Self {
        self.options.alternative = alternative;
        self
    }

    pub fn force_normal(mut self, force_normal: bool) -> Self {
        self.options.force_normal = force_normal;
        self
    }

    pub fn normality(mut self, normality: NormalityOptions) -> Self {
        self.options.normality = normality;
        self
    }

    pub fn max_permutations(mut self, max_permutations: usize) -> Self {
        self.options.max_permutations = Some(max_permutations);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = seed;
        self
    }

    pub fn policy(mut self, policy: NonparametricPolicy) -> Self {
        self.options.policy = policy;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    pub fn build(self) -> MeanTestOptions {
        self.options
    }
}

/// Tests `H0: mean == m` with the procedure suited to the sample.
///
/// For binomial samples `m` is the hypothesized success probability and must lie in
/// `[0, 1]`. Constant samples are never treated as normal; they go to the
/// nonparametric branch and are flagged as degenerate.
pub fn single_mean(sample: &[f64], m: f64, options: &MeanTestOptions) -> anyhow::Result<MeanTestOutcome> {
    if sample.is_empty() {
        return Err(HypothesisError::EmptySample.into());
    }
    require_finite(sample)?;
    require_alpha(options.alpha)?;
    if !m.is_finite() {
        anyhow::bail!("Hypothesized mean must be finite, got {}", m);
    }

    let level = trace_level(options.verbose);
    let degenerate = sample.std_population() == Some(0.0);
    log::log!(
        level,
        "Mean test for data, length = {}, m = {}, alternative = {}",
        sample.len(),
        m,
        options.alternative
    );

    if is_binomial(sample) {
        let (successes, trials) = count_successes(sample);
        let p_value = binomial_test(successes, trials, m, options.alternative)?;
        let confint = proportion_confint(successes, trials, options.alpha, ProportionInterval::Wilson)?;
        let accepted = p_value > options.alpha;
        log::log!(
            level,
            "Binomial data: {} of {} successes --> p-value={}, accepted={}",
            successes,
            trials,
            p_value,
            accepted
        );
        return Ok(MeanTestOutcome {
            accepted,
            degenerate,
            normality: None,
            branch: MeanTestBranch::Binomial {
                successes,
                trials,
                p_value,
                confint,
            },
        });
    }

    let (normal, normality) = if degenerate {
        log::log!(level, "Data is constant; skipping normality checks");
        (false, Some(NormalityVerdict::Undetermined))
    } else if options.force_normal {
        log::log!(level, "Normality forced by caller");
        (true, None)
    } else {
        let verdict = check_normal(sample, &options.normality_options())?;
        (verdict.is_normal(), Some(verdict))
    };

    let outcome = if normal {
        parametric_branch(sample, m, options, level)?
    } else {
        nonparametric_branch(sample, m, options, level)?
    };

    Ok(MeanTestOutcome {
        degenerate,
        normality,
        ..outcome
    })
}

fn parametric_branch(
    sample: &[f64],
    m: f64,
    options: &MeanTestOptions,
    level: log::Level,
) -> anyhow::Result<MeanTestOutcome> {
    let (method, result) = match options.known_sd {
        Some(sd) if sd > 0.0 => (
            ParametricMethod::ZTest,
            z_test(sample, m, sd, options.alternative)?,
        ),
        _ => (
            ParametricMethod::TTest,
            one_sample_t_test(sample, m, options.alternative)?,
        ),
    };
    let confint = mean_confint(sample, options.alpha)?;
    let accepted = result.not_rejected(options.alpha);
    log::log!(
        level,
        "Normal data, {}: T={}, p-value={}, accepted={}",
        method,
        result.statistic,
        result.p_value,
        accepted
    );

    Ok(MeanTestOutcome {
        accepted,
        degenerate: false,
        normality: None,
        branch: MeanTestBranch::Parametric {
            method,
            result,
            confint,
        },
    })
}

fn nonparametric_branch(
    sample: &[f64],
    m: f64,
    options: &MeanTestOptions,
    level: log::Level,
) -> anyhow::Result<MeanTestOutcome> {
    let sign = sign_test(sample, m, options.alternative)?;
    log::log!(level, "Sign test: M={}, p-value={}", sign.statistic, sign.p_value);

    let differences: Vec<f64> = sample.iter().map(|&x| x - m).collect();
    let wilcoxon = wilcoxon_signed_rank(&differences, options.alternative)?;
    log::log!(
        level,
        "Wilcoxon signed-rank: T={}, p-value={}",
        wilcoxon.statistic,
        wilcoxon.p_value
    );

    let permutation_options = options.permutation_options(sample.len());
    let permutation = permutation_test(sample, m, &permutation_options)?;
    log::log!(
        level,
        "Permutation test ({:?}, {} assignments): T={}, p-value={}",
        permutation.mode,
        permutation.distribution_size,
        permutation.statistic,
        permutation.p_value
    );

    let accepted = options.policy.combine(
        sign.not_rejected(options.alpha),
        wilcoxon.not_rejected(options.alpha),
        permutation.p_value > options.alpha,
    );
    log::log!(level, "Nonparametric decision ({:?}): accepted={}", options.policy, accepted);

    Ok(MeanTestOutcome {
        accepted,
        degenerate: false,
        normality: None,
        branch: MeanTestBranch::Nonparametric {
            sign,
            wilcoxon,
            permutation,
            policy: options.policy,
        },
    })
}
