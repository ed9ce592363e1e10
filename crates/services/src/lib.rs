#![forbid(unsafe_code)]

pub mod app_services;
pub mod debounce;
pub mod error;
pub mod progress_service;
pub mod sessions;
pub mod stopwatch;

pub use drill_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use debounce::{Debouncer, SettleGate};
pub use error::{AppServicesError, SelectionError, SessionError};
pub use progress_service::{LoadedProgress, ProgressService, StoreLoadNotice};
pub use stopwatch::Stopwatch;

pub use sessions::{
    Advance, AppState, Applied, EngineSettings, FavoriteToggle, GradeReport, PracticeController,
    Selector, SessionEngine, SessionProgress, SessionStart, SessionState, Shuffler,
};
