use async_trait::async_trait;
use drill_core::model::Progress;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::record::ProgressRecord;

/// Key under which the whole progress blob is stored.
pub const PROGRESS_KEY: &str = "userProgress";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the progress store.
///
/// The store is read and written as a whole; there is no partial update.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the persisted progress, if any has been written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a malformed blob, or other
    /// storage errors when the backend cannot be read.
    async fn load_progress(&self) -> Result<Option<Progress>, StorageError>;

    /// Replace the persisted progress with `progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob cannot be encoded or written.
    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError>;
}

/// In-memory repository holding the encoded blob, for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    blob: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with a raw blob, e.g. one written by another version.
    #[must_use]
    pub fn with_raw_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(blob.into()))),
        }
    }

    /// The currently stored blob, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw_blob(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .blob
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self) -> Result<Option<Progress>, StorageError> {
        let Some(blob) = self.raw_blob()? else {
            return Ok(None);
        };
        ProgressRecord::decode(&blob).map(Some)
    }

    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError> {
        let encoded = ProgressRecord::encode(progress)?;
        let mut guard = self
            .blob
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(encoded);
        Ok(())
    }
}

/// Storage handles behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
