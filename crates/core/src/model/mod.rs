mod catalog;
mod filters;
mod grade;
mod ids;
mod problem;
mod progress;

pub use catalog::{Catalog, CatalogError, SEARCH_MIN_TERM_LEN, SEARCH_RESULT_LIMIT};
pub use filters::{PracticeMode, ProblemFilters};
pub use grade::{Grade, GradeError};
pub use ids::{ParseIdError, ProblemId};
pub use problem::{Difficulty, Problem, ProblemDraft, ProblemError};
pub use progress::{GradeEffect, Progress, ProgressError, ProgressReport, StreakStats};
