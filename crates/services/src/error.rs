//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::ProblemId;
use storage::catalog::CatalogLoadError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while building a working set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("no problems match the selected criteria ({mode})")]
    EmptySelection { mode: &'static str },
    #[error("problem {0} is not in the catalog")]
    UnknownProblem(ProblemId),
}

/// Errors emitted by the session engine and controller.
///
/// None of these leave progress half-updated: the failing operation is a no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("no problem is currently shown")]
    MissingCurrentProblem,
    #[error("the current problem was already graded")]
    AlreadyGraded,
    #[error("no session is in progress")]
    NotInSession,
    #[error("the current pass is not complete")]
    PassNotComplete,
}

impl SessionError {
    #[must_use]
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, SessionError::Selection(SelectionError::EmptySelection { .. }))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),
}
