pub mod statistics;
mod utils;

pub use statistics::mean::{single_mean, MeanTestOptions, MeanTestOutcome};
pub use statistics::normality::{assess_normality, check_normal, NormalityOptions};
pub use statistics::permutation::{permutation_test, PermutationOptions, PermutationOutcome};
pub use statistics::{Alternative, HypothesisError, NormalityVerdict, TestResult};
pub use utils::SampleMoments;
