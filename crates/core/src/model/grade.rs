use std::fmt;
use std::str::FromStr;

use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("invalid grade: {0}")]
    InvalidGrade(String),
}

//
// ─── GRADE ────────────────────────────────────────────────────────────────────
//

/// Self-assessed recall for the card currently shown.
///
/// - `Easy`: recalled the approach; counts as correct and extends the streak
/// - `Medium`: partial recall; breaks the streak, no count change
/// - `Hard`: could not recall; counts as incorrect and queues for mistakes review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    Easy,
    Medium,
    Hard,
}

impl Grade {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Easy => "easy",
            Grade::Medium => "medium",
            Grade::Hard => "hard",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "e" => Ok(Self::Easy),
            "medium" | "m" => Ok(Self::Medium),
            "hard" | "h" => Ok(Self::Hard),
            other => Err(GradeError::InvalidGrade(other.to_owned())),
        }
    }
}
