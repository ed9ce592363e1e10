use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::catalog::Catalog;
use crate::model::grade::Grade;
use crate::model::ids::ProblemId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("longest streak ({longest}) is below the current streak ({current})")]
    StreakInvariant { current: u32, longest: u32 },

    #[error("problem {0} is listed as a favorite more than once")]
    DuplicateFavorite(ProblemId),
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Aggregate counters across the learner's whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakStats {
    total_seen: u64,
    correct_streak: u32,
    longest_streak: u32,
}

impl StreakStats {
    /// Rehydrate stats from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::StreakInvariant` if `longest_streak < correct_streak`.
    pub fn from_persisted(
        total_seen: u64,
        correct_streak: u32,
        longest_streak: u32,
    ) -> Result<Self, ProgressError> {
        if longest_streak < correct_streak {
            return Err(ProgressError::StreakInvariant {
                current: correct_streak,
                longest: longest_streak,
            });
        }
        Ok(Self {
            total_seen,
            correct_streak,
            longest_streak,
        })
    }

    #[must_use]
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    #[must_use]
    pub fn correct_streak(&self) -> u32 {
        self.correct_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    fn record(&mut self, grade: Grade) {
        self.total_seen = self.total_seen.saturating_add(1);
        match grade {
            Grade::Easy => {
                self.correct_streak = self.correct_streak.saturating_add(1);
                self.longest_streak = self.longest_streak.max(self.correct_streak);
            }
            Grade::Medium | Grade::Hard => self.correct_streak = 0,
        }
    }
}

//
// ─── GRADE EFFECT ──────────────────────────────────────────────────────────────
//

/// What a single grading event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeEffect {
    pub problem_id: ProblemId,
    pub grade: Grade,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub stats: StreakStats,
    pub graded_at: DateTime<Utc>,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Durable per-problem history plus aggregate streak stats.
///
/// History is additive: a problem can carry both correct and incorrect counts.
/// Entries for ids missing from the current catalog are kept but never selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    correct: BTreeMap<ProblemId, u32>,
    incorrect: BTreeMap<ProblemId, u32>,
    last_seen: BTreeMap<ProblemId, DateTime<Utc>>,
    notes: BTreeMap<ProblemId, String>,
    favorites: Vec<ProblemId>,
    stats: StreakStats,
}

impl Progress {
    /// Rehydrate progress from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::DuplicateFavorite` if an id repeats in `favorites`.
    pub fn from_persisted(
        correct: BTreeMap<ProblemId, u32>,
        incorrect: BTreeMap<ProblemId, u32>,
        last_seen: BTreeMap<ProblemId, DateTime<Utc>>,
        notes: BTreeMap<ProblemId, String>,
        favorites: Vec<ProblemId>,
        stats: StreakStats,
    ) -> Result<Self, ProgressError> {
        for (pos, id) in favorites.iter().enumerate() {
            if favorites[..pos].contains(id) {
                return Err(ProgressError::DuplicateFavorite(id.clone()));
            }
        }
        Ok(Self {
            correct,
            incorrect,
            last_seen,
            notes,
            favorites,
            stats,
        })
    }

    #[must_use]
    pub fn correct(&self) -> &BTreeMap<ProblemId, u32> {
        &self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> &BTreeMap<ProblemId, u32> {
        &self.incorrect
    }

    #[must_use]
    pub fn last_seen(&self) -> &BTreeMap<ProblemId, DateTime<Utc>> {
        &self.last_seen
    }

    #[must_use]
    pub fn notes(&self) -> &BTreeMap<ProblemId, String> {
        &self.notes
    }

    /// Favorites in the order they were added.
    #[must_use]
    pub fn favorites(&self) -> &[ProblemId] {
        &self.favorites
    }

    #[must_use]
    pub fn stats(&self) -> StreakStats {
        self.stats
    }

    #[must_use]
    pub fn correct_count(&self, id: &ProblemId) -> u32 {
        self.correct.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn incorrect_count(&self, id: &ProblemId) -> u32 {
        self.incorrect.get(id).copied().unwrap_or(0)
    }

    /// Sole membership test for mistakes review.
    #[must_use]
    pub fn is_mistake(&self, id: &ProblemId) -> bool {
        self.incorrect_count(id) > 0
    }

    #[must_use]
    pub fn is_favorite(&self, id: &ProblemId) -> bool {
        self.favorites.contains(id)
    }

    #[must_use]
    pub fn note(&self, id: &ProblemId) -> Option<&str> {
        self.notes.get(id).map(String::as_str)
    }

    /// Apply one grading event as a single logical update.
    pub fn apply_grade(&mut self, id: &ProblemId, grade: Grade, at: DateTime<Utc>) -> GradeEffect {
        match grade {
            Grade::Easy => bump(&mut self.correct, id),
            Grade::Medium => {}
            Grade::Hard => bump(&mut self.incorrect, id),
        }
        self.stats.record(grade);
        self.last_seen.insert(id.clone(), at);

        GradeEffect {
            problem_id: id.clone(),
            grade,
            correct_count: self.correct_count(id),
            incorrect_count: self.incorrect_count(id),
            stats: self.stats,
            graded_at: at,
        }
    }

    /// Flip favorite membership; returns whether `id` is now a favorite.
    pub fn toggle_favorite(&mut self, id: &ProblemId) -> bool {
        if let Some(pos) = self.favorites.iter().position(|fav| fav == id) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(id.clone());
            true
        }
    }

    /// Overwrite the note verbatim. An empty string is stored, not removed.
    pub fn set_note(&mut self, id: &ProblemId, text: impl Into<String>) {
        self.notes.insert(id.clone(), text.into());
    }
}

fn bump(table: &mut BTreeMap<ProblemId, u32>, id: &ProblemId) {
    let count = table.entry(id.clone()).or_insert(0);
    *count = count.saturating_add(1);
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Aggregate numbers for the report view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub total_problems: usize,
    pub total_seen: u64,
    pub problems_correct: usize,
    pub problems_incorrect: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub favorites: usize,
}

impl ProgressReport {
    #[must_use]
    pub fn build(catalog: &Catalog, progress: &Progress) -> Self {
        let stats = progress.stats();
        Self {
            total_problems: catalog.len(),
            total_seen: stats.total_seen(),
            problems_correct: progress.correct().values().filter(|&&n| n > 0).count(),
            problems_incorrect: progress.incorrect().values().filter(|&&n| n > 0).count(),
            current_streak: stats.correct_streak(),
            longest_streak: stats.longest_streak(),
            favorites: progress.favorites().len(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
