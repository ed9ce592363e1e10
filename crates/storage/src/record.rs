use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use drill_core::model::{ProblemId, Progress, StreakStats};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

/// JSON shape of the persisted progress blob.
///
/// Field names match the blob written by earlier versions of the tool, so an
/// existing store keeps loading. Missing sections default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub correct: BTreeMap<ProblemId, u32>,
    pub incorrect: BTreeMap<ProblemId, u32>,
    pub last_seen: BTreeMap<ProblemId, DateTime<Utc>>,
    pub notes: BTreeMap<ProblemId, String>,
    pub favorites: Vec<ProblemId>,
    pub stats: StatsRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsRecord {
    pub total_seen: u64,
    pub correct_streak: u32,
    pub longest_streak: u32,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &Progress) -> Self {
        let stats = progress.stats();
        Self {
            correct: progress.correct().clone(),
            incorrect: progress.incorrect().clone(),
            last_seen: progress.last_seen().clone(),
            notes: progress.notes().clone(),
            favorites: progress.favorites().to_vec(),
            stats: StatsRecord {
                total_seen: stats.total_seen(),
                correct_streak: stats.correct_streak(),
                longest_streak: stats.longest_streak(),
            },
        }
    }

    /// Convert the record back into domain `Progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the record violates a progress invariant.
    pub fn into_progress(self) -> Result<Progress, StorageError> {
        let stats = StreakStats::from_persisted(
            self.stats.total_seen,
            self.stats.correct_streak,
            self.stats.longest_streak,
        )
        .map_err(ser)?;
        Progress::from_persisted(
            self.correct,
            self.incorrect,
            self.last_seen,
            self.notes,
            self.favorites,
            stats,
        )
        .map_err(ser)
    }

    /// Encode progress as the JSON blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(progress: &Progress) -> Result<String, StorageError> {
        serde_json::to_string(&Self::from_progress(progress)).map_err(ser)
    }

    /// Decode a JSON blob into `Progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed JSON or invalid state.
    pub fn decode(blob: &str) -> Result<Progress, StorageError> {
        serde_json::from_str::<Self>(blob)
            .map_err(ser)?
            .into_progress()
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}
