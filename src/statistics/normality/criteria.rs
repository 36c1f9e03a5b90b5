use super::anderson::anderson_darling;
use super::dagostino::dagostino_k2;
use super::probplot::{probability_plot, ProbPlotFit};
use super::shapiro::shapiro_wilk;
use std::fmt;

/// Built-in normality criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestCriterion {
    /// Shapiro-Wilk W.
    Shapiro,
    /// D'Agostino-Pearson K².
    NormalTest,
    /// Anderson-Darling A² against its critical-value table.
    Anderson,
    /// Probability-plot fit; diagnostic only.
    QQ,
}

impl TestCriterion {
    pub fn name(&self) -> &'static str {
        match self {
            TestCriterion::Shapiro => "shapiro",
            TestCriterion::NormalTest => "normaltest",
            TestCriterion::Anderson => "anderson",
            TestCriterion::QQ => "qq",
        }
    }

    pub fn adapter(&self) -> Box<dyn NormalityCriterion> {
        match self {
            TestCriterion::Shapiro => Box::new(ShapiroCriterion),
            TestCriterion::NormalTest => Box::new(NormalTestCriterion),
            TestCriterion::Anderson => Box::new(AndersonCriterion),
            TestCriterion::QQ => Box::new(QQCriterion),
        }
    }
}

impl fmt::Display for TestCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw output of a criterion, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionDetails {
    PValue(f64),
    CriticalTable {
        critical_values: Vec<f64>,
        significance_levels: Vec<f64>,
    },
    ProbPlot(ProbPlotFit),
}

/// Per-criterion record of a normality vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteResult {
    pub criterion: &'static str,
    /// `None` for diagnostic criteria, which never vote.
    pub vote: Option<bool>,
    pub statistic: f64,
    pub details: CriterionDetails,
}

/// A normality check that turns a standardized sample into a vote.
pub trait NormalityCriterion {
    fn name(&self) -> &'static str;

    /// Diagnostic criteria are evaluated but excluded from the quorum.
    fn is_diagnostic(&self) -> bool {
        false
    }

    fn evaluate(&self, standardized: &[f64], alpha: f64) -> anyhow::Result<VoteResult>;
}

pub struct ShapiroCriterion;

impl NormalityCriterion for ShapiroCriterion {
    fn name(&self) -> &'static str {
        TestCriterion::Shapiro.name()
    }

    fn evaluate(&self, standardized: &[f64], alpha: f64) -> anyhow::Result<VoteResult> {
        let r = shapiro_wilk(standardized)?;
        Ok(VoteResult {
            criterion: self.name(),
            vote: Some(r.p_value > alpha),
            statistic: r.statistic,
            details: CriterionDetails::PValue(r.p_value),
        })
    }
}

pub struct NormalTestCriterion;

impl NormalityCriterion for NormalTestCriterion {
    fn name(&self) -> &'static str {
        TestCriterion::NormalTest.name()
    }

    fn evaluate(&self, standardized: &[f64], alpha: f64) -> anyhow::Result<VoteResult> {
        let r = dagostino_k2(standardized)?;
        Ok(VoteResult {
            criterion: self.name(),
            vote: Some(r.p_value > alpha),
            statistic: r.statistic,
            details: CriterionDetails::PValue(r.p_value),
        })
    }
}

/// Votes normal only when A² stays below every tabulated critical value; `alpha`
/// does not enter the decision.
pub struct AndersonCriterion;

impl NormalityCriterion for AndersonCriterion {
    fn name(&self) -> &'static str {
        TestCriterion::Anderson.name()
    }

    fn evaluate(&self, standardized: &[f64], _alpha: f64) -> anyhow::Result<VoteResult> {
        let r = anderson_darling(standardized)?;
        let vote = r.exceedances() == 0;
        Ok(VoteResult {
            criterion: self.name(),
            vote: Some(vote),
            statistic: r.statistic,
            details: CriterionDetails::CriticalTable {
                critical_values: r.critical_values,
                significance_levels: r.significance_levels,
            },
        })
    }
}

pub struct QQCriterion;

impl NormalityCriterion for QQCriterion {
    fn name(&self) -> &'static str {
        TestCriterion::QQ.name()
    }

    fn is_diagnostic(&self) -> bool {
        true
    }

    fn evaluate(&self, standardized: &[f64], _alpha: f64) -> anyhow::Result<VoteResult> {
        let fit = probability_plot(standardized)?;
        Ok(VoteResult {
            criterion: self.name(),
            vote: None,
            statistic: fit.r,
            details: CriterionDetails::ProbPlot(fit),
        })
    }
}
