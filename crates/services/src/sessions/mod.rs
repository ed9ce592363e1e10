mod engine;
mod progress;
mod select;
mod shuffle;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{SelectionError, SessionError};
pub use engine::{Advance, SessionEngine, SessionStart, SessionState};
pub use progress::SessionProgress;
pub use select::Selector;
pub use shuffle::Shuffler;
pub use workflow::{
    AppState, Applied, EngineSettings, FavoriteToggle, GradeReport, PracticeController,
};
