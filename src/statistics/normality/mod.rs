//! # Normality voting
//!
//! Combines several independent normality criteria into one verdict. Each criterion
//! casts a boolean vote on the standardized sample and the sample is declared normal
//! when the number of affirmative votes reaches the quorum. Unless a quorum is given,
//! every voting criterion must agree.
//!
//! Constant or empty samples cannot be tested for shape and yield
//! [`NormalityVerdict::Undetermined`].

mod anderson;
mod criteria;
mod dagostino;
mod probplot;
mod shapiro;

pub use anderson::{anderson_darling, AndersonResult, SIGNIFICANCE_LEVELS};
pub use criteria::{
    AndersonCriterion, CriterionDetails, NormalTestCriterion, NormalityCriterion, QQCriterion,
    ShapiroCriterion, TestCriterion, VoteResult,
};
pub use dagostino::dagostino_k2;
pub use probplot::{probability_plot, ProbPlotFit};
pub use shapiro::shapiro_wilk;

use crate::statistics::{require_alpha, HypothesisError, NormalityVerdict};
use crate::utils::{require_finite, trace_level, SampleMoments};
use std::collections::{HashMap, HashSet};

/// Criteria evaluated when none are requested explicitly.
pub const DEFAULT_CRITERIA: [TestCriterion; 3] = [
    TestCriterion::Shapiro,
    TestCriterion::NormalTest,
    TestCriterion::Anderson,
];

pub const DEFAULT_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalityOptions {
    pub alpha: f64,
    pub criteria: Vec<TestCriterion>,
    /// Minimum number of affirmative votes. `None` or `Some(0)` requires unanimity.
    pub quorum: Option<usize>,
    pub verbose: bool,
}

impl Default for NormalityOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            criteria: DEFAULT_CRITERIA.to_vec(),
            quorum: None,
            verbose: false,
        }
    }
}

impl NormalityOptions {
    pub fn builder() -> NormalityOptionsBuilder {
        NormalityOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalityOptionsBuilder {
    options: NormalityOptions,
}

impl NormalityOptionsBuilder {
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.options.alpha = alpha;
        self
    }

    pub fn criteria(mut self, criteria: &[TestCriterion]) -> Self {
        self.options.criteria = criteria.to_vec();
        self
    }

    pub fn quorum(mut self, quorum: usize) -> Self {
        self.options.quorum = Some(quorum);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    pub fn build(self) -> NormalityOptions {
        self.options
    }
}

/// Full outcome of a normality vote.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalityReport {
    pub verdict: NormalityVerdict,
    /// Results keyed by criterion name. Empty when the verdict is undetermined.
    pub votes: HashMap<&'static str, VoteResult>,
    pub quorum: usize,
    pub affirmative: usize,
}

/// Runs a set of criteria and aggregates their votes.
pub struct NormalityVoter {
    criteria: Vec<Box<dyn NormalityCriterion>>,
    alpha: f64,
    quorum: Option<usize>,
    verbose: bool,
}

// Keeps the first criterion of each name; votes are keyed by name.
fn unique_by_name(criteria: Vec<Box<dyn NormalityCriterion>>) -> Vec<Box<dyn NormalityCriterion>> {
    let mut seen = HashSet::with_capacity(criteria.len());
    criteria
        .into_iter()
        .filter(|c| seen.insert(c.name()))
        .collect()
}

impl NormalityVoter {
    pub fn new(options: &NormalityOptions) -> Self {
        Self {
            criteria: unique_by_name(options.criteria.iter().map(|c| c.adapter()).collect()),
            alpha: options.alpha,
            quorum: options.quorum,
            verbose: options.verbose,
        }
    }

    /// Voter over caller-supplied criteria, with default alpha and unanimous quorum.
    ///
    /// Criteria sharing a name are evaluated once.
    pub fn with_criteria(criteria: Vec<Box<dyn NormalityCriterion>>) -> Self {
        Self {
            criteria: unique_by_name(criteria),
            alpha: DEFAULT_ALPHA,
            quorum: None,
            verbose: false,
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn quorum(mut self, quorum: usize) -> Self {
        self.quorum = Some(quorum);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn resolve_quorum(&self) -> anyhow::Result<usize> {
        let voting = self.criteria.iter().filter(|c| !c.is_diagnostic()).count();
        if voting == 0 {
            return Err(HypothesisError::NoVotingCriteria.into());
        }
        match self.quorum {
            None | Some(0) => Ok(voting),
            Some(q) if q > voting => Err(HypothesisError::QuorumExceedsCriteria {
                quorum: q,
                criteria: voting,
            }
            .into()),
            Some(q) => Ok(q),
        }
    }

    pub fn assess(&self, sample: &[f64]) -> anyhow::Result<NormalityReport> {
        require_alpha(self.alpha)?;
        let quorum = self.resolve_quorum()?;
        require_finite(sample)?;

        let level = trace_level(self.verbose);
        log::log!(level, "Normality test for data, length = {}", sample.len());

        let standardized = match sample.standardized() {
            Some(z) => z,
            None => {
                log::log!(level, "Data is empty or constant; normality undetermined");
                return Ok(NormalityReport {
                    verdict: NormalityVerdict::Undetermined,
                    votes: HashMap::new(),
                    quorum,
                    affirmative: 0,
                });
            }
        };

        let mut votes = HashMap::with_capacity(self.criteria.len());
        for criterion in &self.criteria {
            let result = criterion.evaluate(&standardized, self.alpha)?;
            match &result.details {
                CriterionDetails::PValue(p) => log::log!(
                    level,
                    "{}:\t{:?} --> T={}, p-value={}",
                    result.criterion,
                    result.vote,
                    result.statistic,
                    p
                ),
                CriterionDetails::CriticalTable {
                    critical_values,
                    significance_levels,
                } => log::log!(
                    level,
                    "{}:\t{:?} --> T={}, {:?}, {:?}",
                    result.criterion,
                    result.vote,
                    result.statistic,
                    critical_values,
                    significance_levels
                ),
                CriterionDetails::ProbPlot(fit) => log::log!(
                    level,
                    "{}:\tslope={}, intercept={}, r={}",
                    result.criterion,
                    fit.slope,
                    fit.intercept,
                    fit.r
                ),
            }
            votes.insert(result.criterion, result);
        }

        let affirmative = votes.values().filter(|v| v.vote == Some(true)).count();
        let verdict = if affirmative >= quorum {
            NormalityVerdict::Normal
        } else {
            NormalityVerdict::NotNormal
        };
        log::log!(
            level,
            "Normality verdict: {} ({} of {} required votes)",
            verdict,
            affirmative,
            quorum
        );

        Ok(NormalityReport {
            verdict,
            votes,
            quorum,
            affirmative,
        })
    }
}

/// Votes on the normality of `sample` and returns the full report.
pub fn assess_normality(
    sample: &[f64],
    options: &NormalityOptions,
) -> anyhow::Result<NormalityReport> {
    NormalityVoter::new(options).assess(sample)
}

/// Votes on the normality of `sample`.
///
/// Returns [`NormalityVerdict::Undetermined`] for empty or constant samples. Callers
/// dispatching on the verdict should treat that as "not normal".
pub fn check_normal(sample: &[f64], options: &NormalityOptions) -> anyhow::Result<NormalityVerdict> {
    Ok(assess_normality(sample, options)?.verdict)
}
