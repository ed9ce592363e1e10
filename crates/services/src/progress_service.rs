use std::fmt;
use std::sync::Arc;

use drill_core::model::Progress;
use storage::repository::{ProgressRepository, StorageError};

/// Non-fatal notice that stored progress could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLoadNotice {
    pub reason: String,
}

impl fmt::Display for StoreLoadNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "saved progress could not be read, starting fresh ({})", self.reason)
    }
}

/// Result of loading the store: always usable progress, plus an optional notice.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProgress {
    pub progress: Progress,
    pub notice: Option<StoreLoadNotice>,
}

/// Reads and writes the progress store as a whole.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self { repo }
    }

    /// Load progress, degrading to empty history when the store is absent or unreadable.
    pub async fn load(&self) -> LoadedProgress {
        match self.repo.load_progress().await {
            Ok(Some(progress)) => {
                tracing::debug!(
                    total_seen = progress.stats().total_seen(),
                    "progress loaded"
                );
                LoadedProgress {
                    progress,
                    notice: None,
                }
            }
            Ok(None) => LoadedProgress {
                progress: Progress::default(),
                notice: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "progress store unreadable, using defaults");
                LoadedProgress {
                    progress: Progress::default(),
                    notice: Some(StoreLoadNotice {
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }

    /// Write the entire store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; the caller keeps its in-memory state.
    pub async fn save(&self, progress: &Progress) -> Result<(), StorageError> {
        self.repo.save_progress(progress).await.inspect_err(|err| {
            tracing::warn!(error = %err, "failed to persist progress");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{Grade, ProblemId};
    use drill_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn missing_store_loads_defaults_without_notice() {
        let service = ProgressService::new(Arc::new(InMemoryRepository::new()));
        let loaded = service.load().await;
        assert_eq!(loaded.progress, Progress::default());
        assert!(loaded.notice.is_none());
    }

    #[tokio::test]
    async fn corrupt_store_loads_defaults_with_notice() {
        let repo = InMemoryRepository::with_raw_blob("not json at all");
        let service = ProgressService::new(Arc::new(repo));
        let loaded = service.load().await;
        assert_eq!(loaded.progress, Progress::default());
        assert!(loaded.notice.is_some());
    }

    #[tokio::test]
    async fn saved_progress_is_loaded_back() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ProgressService::new(repo.clone());
        let mut progress = Progress::default();
        progress.apply_grade(&ProblemId::new("3").unwrap(), Grade::Easy, fixed_now());

        service.save(&progress).await.unwrap();
        assert_eq!(service.load().await.progress, progress);
    }
}
