use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::{ParseIdError, ProblemId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error(transparent)]
    InvalidId(#[from] ParseIdError),

    #[error("problem name cannot be empty")]
    EmptyName,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("frequency is not a number: {0}")]
    InvalidFrequency(String),

    #[error("hardness rating is not a non-negative integer: {0}")]
    InvalidHardness(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Published difficulty tier of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ProblemError::UnknownDifficulty(s.trim().to_owned())),
        }
    }
}

//
// ─── PROBLEM ───────────────────────────────────────────────────────────────────
//

/// Unvalidated problem fields as they come out of a catalog row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemDraft {
    pub id: String,
    pub name: String,
    pub link: String,
    pub answer: String,
    pub complexity: String,
    pub difficulty: String,
    pub frequency: String,
    pub hardness_rating: String,
}

impl ProblemDraft {
    /// Parse typed fields and produce an immutable `Problem`.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError` when the id or name is blank, or when
    /// difficulty, frequency, or hardness cannot be parsed.
    pub fn validate(self) -> Result<Problem, ProblemError> {
        let id = ProblemId::new(&self.id)?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProblemError::EmptyName);
        }
        let difficulty = self.difficulty.parse::<Difficulty>()?;

        let frequency_raw = self.frequency.trim();
        let frequency = frequency_raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ProblemError::InvalidFrequency(frequency_raw.to_owned()))?;

        let hardness_raw = self.hardness_rating.trim();
        let hardness_rating = hardness_raw
            .parse::<u32>()
            .map_err(|_| ProblemError::InvalidHardness(hardness_raw.to_owned()))?;

        Ok(Problem {
            id,
            name: name.to_owned(),
            link: self.link.trim().to_owned(),
            answer: self.answer,
            complexity: self.complexity.trim().to_owned(),
            difficulty,
            frequency,
            hardness_rating,
        })
    }
}

/// A single practice problem. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    id: ProblemId,
    name: String,
    link: String,
    answer: String,
    complexity: String,
    difficulty: Difficulty,
    frequency: f64,
    hardness_rating: u32,
}

impl Problem {
    #[must_use]
    pub fn id(&self) -> &ProblemId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn complexity(&self) -> &str {
        &self.complexity
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    #[must_use]
    pub fn hardness_rating(&self) -> u32 {
        self.hardness_rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProblemDraft {
        ProblemDraft {
            id: "1".into(),
            name: "Two Sum".into(),
            link: "https://leetcode.com/problems/two-sum/".into(),
            answer: "Hash map of complements".into(),
            complexity: "O(n)".into(),
            difficulty: "easy".into(),
            frequency: "87.5".into(),
            hardness_rating: "2".into(),
        }
    }

    #[test]
    fn draft_validates_typed_fields() {
        let problem = draft().validate().unwrap();
        assert_eq!(problem.id().as_str(), "1");
        assert_eq!(problem.difficulty(), Difficulty::Easy);
        assert!((problem.frequency() - 87.5).abs() < f64::EPSILON);
        assert_eq!(problem.hardness_rating(), 2);
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        let mut d = draft();
        d.difficulty = "Brutal".into();
        assert_eq!(
            d.validate().unwrap_err(),
            ProblemError::UnknownDifficulty("Brutal".into())
        );
    }

    #[test]
    fn non_numeric_frequency_is_rejected() {
        let mut d = draft();
        d.frequency = "often".into();
        assert!(matches!(
            d.validate().unwrap_err(),
            ProblemError::InvalidFrequency(_)
        ));
    }

    #[test]
    fn negative_hardness_is_rejected() {
        let mut d = draft();
        d.hardness_rating = "-1".into();
        assert!(matches!(
            d.validate().unwrap_err(),
            ProblemError::InvalidHardness(_)
        ));
    }

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" Medium ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
    }
}
