#![forbid(unsafe_code)]

pub mod catalog;
pub mod record;
pub mod repository;
pub mod sqlite;

pub use catalog::{CatalogLoadError, load_catalog, parse_catalog};
pub use record::ProgressRecord;
pub use repository::{InMemoryRepository, PROGRESS_KEY, ProgressRepository, Storage, StorageError};
