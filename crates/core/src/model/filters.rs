use std::collections::BTreeSet;

use crate::model::ids::ProblemId;
use crate::model::problem::{Difficulty, Problem};

/// Conjunctive filter set for custom practice.
///
/// Each criterion left unset is vacuously true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemFilters {
    pub difficulties: BTreeSet<Difficulty>,
    pub min_frequency: Option<f64>,
    pub max_hardness: Option<u32>,
    /// Restrict to the learner's favorites.
    pub favorites_only: bool,
}

impl ProblemFilters {
    #[must_use]
    pub fn favorites() -> Self {
        Self {
            favorites_only: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_difficulties(mut self, difficulties: impl IntoIterator<Item = Difficulty>) -> Self {
        self.difficulties.extend(difficulties);
        self
    }

    #[must_use]
    pub fn with_min_frequency(mut self, min: f64) -> Self {
        self.min_frequency = Some(min);
        self
    }

    #[must_use]
    pub fn with_max_hardness(mut self, max: u32) -> Self {
        self.max_hardness = Some(max);
        self
    }

    /// Catalog-field criteria only; favorites membership is checked by the caller
    /// since it depends on progress.
    #[must_use]
    pub fn matches(&self, problem: &Problem) -> bool {
        if !self.difficulties.is_empty() && !self.difficulties.contains(&problem.difficulty()) {
            return false;
        }
        if let Some(min) = self.min_frequency {
            if problem.frequency() < min {
                return false;
            }
        }
        if let Some(max) = self.max_hardness {
            if problem.hardness_rating() > max {
                return false;
            }
        }
        true
    }
}

/// How a session chooses its working set.
#[derive(Debug, Clone, PartialEq)]
pub enum PracticeMode {
    /// Whole catalog, shuffled.
    Random,
    /// Problems with a positive incorrect count, shuffled.
    Mistakes,
    /// Problems passing every filter, shuffled. Favorites practice lives here.
    Custom(ProblemFilters),
    /// Exactly one problem, typically picked from search.
    Single(ProblemId),
}

impl PracticeMode {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PracticeMode::Random => "random",
            PracticeMode::Mistakes => "mistakes",
            PracticeMode::Custom(filters) if filters.favorites_only => "favorites",
            PracticeMode::Custom(_) => "custom",
            PracticeMode::Single(_) => "single",
        }
    }

    #[must_use]
    pub fn is_shuffled(&self) -> bool {
        !matches!(self, PracticeMode::Single(_))
    }
}
