use async_trait::async_trait;
use chrono::Utc;
use drill_core::model::Progress;
use sqlx::Row;

use crate::record::ProgressRecord;
use crate::repository::{PROGRESS_KEY, ProgressRepository, StorageError};

use super::SqliteRepository;

impl SqliteRepository {
    /// Read a raw blob by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails or the value column is unreadable.
    pub async fn get_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get::<String, _>("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Replace the blob stored under `key` in a single statement.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the write fails.
    pub async fn put_blob(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<Option<Progress>, StorageError> {
        let Some(blob) = self.get_blob(PROGRESS_KEY).await? else {
            return Ok(None);
        };
        ProgressRecord::decode(&blob).map(Some)
    }

    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError> {
        let encoded = ProgressRecord::encode(progress)?;
        self.put_blob(PROGRESS_KEY, &encoded).await
    }
}
