use std::fmt;

/// Statistic and p-value returned by a closed-form test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
        }
    }

    /// Whether the null hypothesis survives at level `alpha`.
    pub fn not_rejected(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Aggregate outcome of the normality vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalityVerdict {
    Normal,
    NotNormal,
    /// Empty or constant sample; the shape cannot be tested.
    Undetermined,
}

impl NormalityVerdict {
    /// Dispatch view of the verdict: `Undetermined` counts as not normal.
    pub fn is_normal(&self) -> bool {
        matches!(self, NormalityVerdict::Normal)
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, NormalityVerdict::Undetermined)
    }
}

impl fmt::Display for NormalityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalityVerdict::Normal => f.write_str("normal"),
            NormalityVerdict::NotNormal => f.write_str("not normal"),
            NormalityVerdict::Undetermined => f.write_str("undetermined"),
        }
    }
}

/// Caller-facing failures that can be matched after downcasting an `anyhow::Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum HypothesisError {
    InvalidAlternative(String),
    NoVotingCriteria,
    QuorumExceedsCriteria { quorum: usize, criteria: usize },
    ExactEnumerationTooLarge { n: usize, ceiling: usize },
    EmptySample,
    NonFiniteSample,
    InvalidProbability(f64),
    InvalidAlpha(f64),
    InsufficientSampleSize { given: usize, needed: usize },
    ZeroVariance,
}

impl fmt::Display for HypothesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HypothesisError::InvalidAlternative(value) => write!(
                f,
                "Invalid alternative '{}': expected one of 'two-sided', 'less', 'greater'",
                value
            ),
            HypothesisError::NoVotingCriteria => {
                write!(f, "At least one voting normality criterion is required")
            }
            HypothesisError::QuorumExceedsCriteria { quorum, criteria } => write!(
                f,
                "Quorum ({}) exceeds the number of voting criteria ({})",
                quorum, criteria
            ),
            HypothesisError::ExactEnumerationTooLarge { n, ceiling } => write!(
                f,
                "Exact permutation test over {} observations exceeds the ceiling of {}; set max_permutations",
                n, ceiling
            ),
            HypothesisError::EmptySample => write!(f, "Sample is empty"),
            HypothesisError::NonFiniteSample => {
                write!(f, "Sample contains NaN or infinite values")
            }
            HypothesisError::InvalidProbability(p) => {
                write!(f, "Probability {} is outside [0, 1]", p)
            }
            HypothesisError::InvalidAlpha(alpha) => {
                write!(f, "Significance level {} is outside (0, 1)", alpha)
            }
            HypothesisError::InsufficientSampleSize { given, needed } => write!(
                f,
                "Sample size {} is below the minimum of {}",
                given, needed
            ),
            HypothesisError::ZeroVariance => write!(f, "Sample has zero variance"),
        }
    }
}

impl std::error::Error for HypothesisError {}
