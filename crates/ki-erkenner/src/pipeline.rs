use core::fmt;
use std::str::FromStr;

use crate::error::TrainingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Classification {
    Human,
    AI,
}

impl Classification {
    /// Returns true if this classification is Human
    #[must_use]
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }

    /// Returns true if this classification is AI
    #[must_use]
    pub fn is_ai(&self) -> bool {
        matches!(self, Self::AI)
    }

    /// Regression target: 0.0 for Human, 1.0 for AI.
    #[must_use]
    pub fn target(&self) -> f64 {
        match self {
            Self::Human => 0.0,
            Self::AI => 1.0,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "Human"),
            Self::AI => write!(f, "AI"),
        }
    }
}

impl From<Classification> for i64 {
    fn from(class: Classification) -> Self {
        match class {
            Classification::Human => 0,
            Classification::AI => 1,
        }
    }
}

/// Parses the corpus label tokens `KI` / `Mensch`, plus `ai` / `human` in any case.
impl FromStr for Classification {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "KI" => Ok(Self::AI),
            "Mensch" => Ok(Self::Human),
            other if other.eq_ignore_ascii_case("ai") => Ok(Self::AI),
            other if other.eq_ignore_ascii_case("human") => Ok(Self::Human),
            other => Err(TrainingError::UnknownLabel(other.to_string())),
        }
    }
}

/// Struct to hold prediction probabilities
/// 0: P(Human), 1: P(AI)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction(f64, f64);

impl Prediction {
    /// Build from P(AI); P(Human) is its complement.
    pub(crate) fn from_ai_probability(ai_prob: f64) -> Self {
        debug_assert!(
            !(ai_prob < 0.0 || ai_prob > 1.0),
            "Probability must lie in [0, 1]"
        );
        Self(1.0 - ai_prob, ai_prob)
    }

    #[must_use]
    pub fn human_probability(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn ai_probability(&self) -> f64 {
        self.1
    }

    /// `[P(Human), P(AI)]`
    #[must_use]
    pub fn probabilities(&self) -> [f64; 2] {
        [self.0, self.1]
    }

    #[inline]
    #[must_use]
    pub fn classification(&self, threshold: f64) -> Classification {
        if self.1 >= threshold {
            Classification::AI
        } else {
            Classification::Human
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P(Human)={:.3}, P(AI)={:.3}", self.0, self.1)
    }
}
