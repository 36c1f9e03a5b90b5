pub mod classify;
pub mod inference;
pub mod mean;
pub mod normality;
pub mod permutation;
mod types;

pub use types::*;

use std::fmt;
use std::str::FromStr;

/// Direction of the alternative hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alternative {
    #[default]
    TwoSided,
    Less,
    Greater,
}

impl FromStr for Alternative {
    type Err = HypothesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "two-sided" | "two_sided" => Ok(Alternative::TwoSided),
            "less" => Ok(Alternative::Less),
            "greater" => Ok(Alternative::Greater),
            _ => Err(HypothesisError::InvalidAlternative(s.to_string())),
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Less => "less",
            Alternative::Greater => "greater",
        };
        f.write_str(name)
    }
}

pub(crate) fn require_alpha(alpha: f64) -> anyhow::Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(HypothesisError::InvalidAlpha(alpha).into());
    }
    Ok(())
}
