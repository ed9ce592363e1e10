use std::path::Path;
use std::sync::Arc;

use drill_core::model::Catalog;
use storage::catalog::load_catalog;
use storage::repository::{ProgressRepository, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_service::{ProgressService, StoreLoadNotice};
use crate::sessions::{EngineSettings, PracticeController, Shuffler};

/// Assembles the catalog and progress store behind one practice controller.
#[derive(Clone)]
pub struct AppServices {
    catalog: Catalog,
    progress: ProgressService,
    clock: Clock,
    seed: Option<u64>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and a TSV catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated,
    /// or the catalog cannot be loaded.
    pub async fn new_sqlite(
        db_url: &str,
        catalog_path: impl AsRef<Path>,
    ) -> Result<Self, AppServicesError> {
        let catalog = load_catalog(catalog_path)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_repository(catalog, storage.progress))
    }

    /// Services over an already loaded catalog and a volatile store.
    #[must_use]
    pub fn in_memory(catalog: Catalog) -> Self {
        Self::with_repository(catalog, Storage::in_memory().progress)
    }

    #[must_use]
    pub fn with_repository(catalog: Catalog, repository: Arc<dyn ProgressRepository>) -> Self {
        Self {
            catalog,
            progress: ProgressService::new(repository),
            clock: Clock::default(),
            seed: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fix the shuffle seed so passes replay identically.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Build the controller and load stored progress into it.
    ///
    /// An unreadable store still yields a usable controller over default
    /// progress; the notice says why.
    pub async fn into_loaded_controller(self) -> (PracticeController, Option<StoreLoadNotice>) {
        let shuffler = self.seed.map_or_else(Shuffler::from_entropy, Shuffler::seeded);
        let mut controller =
            PracticeController::new(self.catalog, self.progress, EngineSettings::default())
                .with_clock(self.clock)
                .with_shuffler(shuffler);
        let notice = controller.load().await;
        (controller, notice)
    }
}
