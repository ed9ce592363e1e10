use std::time::Duration as StdDuration;

use chrono::Duration;

use drill_core::model::{
    Catalog, Grade, PracticeMode, Problem, ProblemId, Progress, ProgressReport,
    SEARCH_MIN_TERM_LEN, SEARCH_RESULT_LIMIT, StreakStats,
};
use storage::repository::StorageError;

use super::engine::{Advance, SessionEngine, SessionStart, SessionState};
use super::progress::SessionProgress;
use super::shuffle::Shuffler;
use crate::Clock;
use crate::debounce::SettleGate;
use crate::error::SessionError;
use crate::progress_service::{ProgressService, StoreLoadNotice};
use crate::stopwatch::Stopwatch;

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for the practice controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// A second favorite toggle on the same problem inside this window is dropped.
    pub favorite_settle: Duration,
    /// Input quiet period before a display adapter runs a search.
    pub search_debounce: StdDuration,
    pub search_result_limit: usize,
    pub search_min_term_len: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            favorite_settle: Duration::milliseconds(500),
            search_debounce: StdDuration::from_millis(300),
            search_result_limit: SEARCH_RESULT_LIMIT,
            search_min_term_len: SEARCH_MIN_TERM_LEN,
        }
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// An in-memory mutation that went through, plus the outcome of persisting it.
///
/// A failed write does not roll back `value`; in-memory state stays authoritative.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub persist_failure: Option<StorageError>,
}

impl<T> Applied<T> {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persist_failure.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
    /// Dropped because the previous toggle has not settled yet.
    Suppressed,
}

/// Everything the display needs after grading a problem.
#[derive(Debug)]
pub struct GradeReport {
    pub problem_id: ProblemId,
    pub grade: Grade,
    pub stats: StreakStats,
    pub advance: Advance,
    pub persist_failure: Option<StorageError>,
}

impl GradeReport {
    /// Short feedback line for the grade just given.
    #[must_use]
    pub fn feedback(&self) -> &'static str {
        match self.grade {
            Grade::Easy => "Great job! Problem marked as understood.",
            Grade::Medium => "Problem marked for practice.",
            Grade::Hard => "Problem added to review list.",
        }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// All mutable state of the tool, owned by one controller.
#[derive(Debug)]
pub struct AppState {
    pub catalog: Catalog,
    pub progress: Progress,
    pub engine: SessionEngine,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives practice sessions and persists every mutation before returning.
pub struct PracticeController {
    state: AppState,
    store: ProgressService,
    settings: EngineSettings,
    clock: Clock,
    shuffler: Shuffler,
    favorite_gate: SettleGate<ProblemId>,
    stopwatch: Stopwatch,
    flipped: bool,
}

impl PracticeController {
    #[must_use]
    pub fn new(catalog: Catalog, store: ProgressService, settings: EngineSettings) -> Self {
        Self {
            state: AppState {
                catalog,
                progress: Progress::default(),
                engine: SessionEngine::new(),
            },
            store,
            favorite_gate: SettleGate::new(settings.favorite_settle),
            settings,
            clock: Clock::default(),
            shuffler: Shuffler::from_entropy(),
            stopwatch: Stopwatch::default(),
            flipped: false,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Shuffler) -> Self {
        self.shuffler = shuffler;
        self
    }

    /// Mutable access to the clock, so fixed clocks can be stepped.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Replace in-memory progress with the persisted store.
    ///
    /// Returns a notice when the store was unreadable and defaults were used.
    pub async fn load(&mut self) -> Option<StoreLoadNotice> {
        let loaded = self.store.load().await;
        self.state.progress = loaded.progress;
        loaded.notice
    }

    //
    // ─── SESSION FLOW ──────────────────────────────────────────────────────────
    //

    /// Start a new session, replacing any current one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` when nothing matches; the controller is
    /// then `Idle`.
    pub fn start_session(&mut self, mode: PracticeMode) -> Result<SessionStart, SessionError> {
        let AppState {
            catalog,
            progress,
            engine,
        } = &mut self.state;
        let started = engine.start_session(catalog, progress, mode, &mut self.shuffler);
        self.on_current_changed();
        started
    }

    /// Jump to one problem picked from search results.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownProblem` for ids outside the catalog.
    pub fn pick(&mut self, id: ProblemId) -> Result<SessionStart, SessionError> {
        self.start_session(PracticeMode::Single(id))
    }

    /// Move on without grading.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInSession` outside an active pass.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        let advance = self.state.engine.advance()?;
        self.on_current_changed();
        Ok(advance)
    }

    /// Grade the current problem, persist, then advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MissingCurrentProblem` or
    /// `SessionError::AlreadyGraded`; progress is untouched in both cases.
    pub async fn grade(&mut self, grade: Grade) -> Result<GradeReport, SessionError> {
        let now = self.clock.now();
        let effect = self
            .state
            .engine
            .record_grade(&mut self.state.progress, grade, now)?;
        let persist_failure = self.persist().await;
        let advance = self.advance()?;

        Ok(GradeReport {
            problem_id: effect.problem_id,
            grade,
            stats: effect.stats,
            advance,
            persist_failure,
        })
    }

    /// Start the next pass with the same mode, re-running selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PassNotComplete` mid-pass, or
    /// `SessionError::Selection` when nothing matches any more.
    pub fn continue_pass(&mut self) -> Result<SessionStart, SessionError> {
        let AppState {
            catalog,
            progress,
            engine,
        } = &mut self.state;
        let started = engine.continue_pass(catalog, progress, &mut self.shuffler);
        self.on_current_changed();
        started
    }

    /// Leave any session. Progress is not touched.
    pub fn return_to_menu(&mut self) {
        self.state.engine.return_to_menu();
        self.on_current_changed();
    }

    //
    // ─── PER-PROBLEM EDITS ─────────────────────────────────────────────────────
    //

    /// Flip favorite membership of the current problem.
    ///
    /// A repeat inside the settle window is reported as `Suppressed` and
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MissingCurrentProblem` with no current problem.
    pub async fn toggle_favorite(&mut self) -> Result<Applied<FavoriteToggle>, SessionError> {
        let id = self.current_id()?;
        if !self.favorite_gate.try_acquire(&id, self.clock.now()) {
            tracing::debug!(problem = %id, "favorite toggle suppressed");
            return Ok(Applied {
                value: FavoriteToggle::Suppressed,
                persist_failure: None,
            });
        }

        let value = if self.state.progress.toggle_favorite(&id) {
            FavoriteToggle::Added
        } else {
            FavoriteToggle::Removed
        };
        tracing::debug!(problem = %id, ?value, "favorite toggled");
        Ok(Applied {
            value,
            persist_failure: self.persist().await,
        })
    }

    /// Overwrite the current problem's note verbatim; an empty string clears it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MissingCurrentProblem` with no current problem.
    pub async fn save_note(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Applied<()>, SessionError> {
        let id = self.current_id()?;
        self.state.progress.set_note(&id, text);
        tracing::debug!(problem = %id, "note saved");
        Ok(Applied {
            value: (),
            persist_failure: self.persist().await,
        })
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Problem> {
        self.state.catalog.search_with(
            term,
            self.settings.search_min_term_len,
            self.settings.search_result_limit,
        )
    }

    #[must_use]
    pub fn app_state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.engine.state()
    }

    #[must_use]
    pub fn mode(&self) -> Option<&PracticeMode> {
        self.state.engine.mode()
    }

    #[must_use]
    pub fn current_problem(&self) -> Option<&Problem> {
        self.state.engine.current_problem()
    }

    /// Cursor and total of the current pass.
    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.state.engine.progress()
    }

    /// Persistent learner history.
    #[must_use]
    pub fn history(&self) -> &Progress {
        &self.state.progress
    }

    #[must_use]
    pub fn stats(&self) -> StreakStats {
        self.state.progress.stats()
    }

    #[must_use]
    pub fn report(&self) -> ProgressReport {
        ProgressReport::build(&self.state.catalog, &self.state.progress)
    }

    #[must_use]
    pub fn note_for_current(&self) -> Option<&str> {
        self.current_problem()
            .and_then(|problem| self.state.progress.note(problem.id()))
    }

    #[must_use]
    pub fn is_favorite_current(&self) -> bool {
        self.current_problem()
            .is_some_and(|problem| self.state.progress.is_favorite(problem.id()))
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Turn the card over. Returns whether the answer side is now showing.
    pub fn flip(&mut self) -> bool {
        if self.current_problem().is_some() {
            self.flipped = !self.flipped;
        }
        self.flipped
    }

    #[must_use]
    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    /// Current stopwatch reading as `MM:SS`.
    #[must_use]
    pub fn elapsed_display(&self) -> String {
        self.stopwatch.display(self.clock.now())
    }

    /// Pause or resume the stopwatch. Returns whether it is now running.
    pub fn toggle_stopwatch(&mut self) -> bool {
        if self.current_problem().is_none() {
            return false;
        }
        self.stopwatch.toggle(self.clock.now())
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn current_id(&self) -> Result<ProblemId, SessionError> {
        self.current_problem()
            .map(|problem| problem.id().clone())
            .ok_or(SessionError::MissingCurrentProblem)
    }

    fn on_current_changed(&mut self) {
        self.flipped = false;
        if self.current_problem().is_some() {
            self.stopwatch.restart(self.clock.now());
        } else {
            self.stopwatch.reset();
        }
    }

    async fn persist(&self) -> Option<StorageError> {
        self.store.save(&self.state.progress).await.err()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use drill_core::model::{Difficulty, ProblemDraft, ProblemFilters};
    use drill_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::repository::{InMemoryRepository, ProgressRepository};

    struct FailingRepository;

    #[async_trait]
    impl ProgressRepository for FailingRepository {
        async fn load_progress(&self) -> Result<Option<Progress>, StorageError> {
            Ok(None)
        }

        async fn save_progress(&self, _progress: &Progress) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }
    }

    fn problem(id: &str, difficulty: &str, hardness: &str) -> Problem {
        ProblemDraft {
            id: id.into(),
            name: format!("Problem {id}"),
            difficulty: difficulty.into(),
            frequency: "50".into(),
            hardness_rating: hardness.into(),
            ..ProblemDraft::default()
        }
        .validate()
        .unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            problem("1", "Easy", "1"),
            problem("2", "Hard", "2"),
            problem("3", "Hard", "5"),
            problem("4", "Medium", "3"),
        ])
        .unwrap()
    }

    fn controller(repo: Arc<dyn ProgressRepository>) -> PracticeController {
        PracticeController::new(
            catalog(),
            ProgressService::new(repo),
            EngineSettings::default(),
        )
        .with_clock(fixed_clock())
        .with_shuffler(Shuffler::seeded(11))
    }

    #[tokio::test]
    async fn grade_persists_then_advances() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut ctl = controller(repo.clone());
        ctl.start_session(PracticeMode::Random).unwrap();
        let first = ctl.current_problem().unwrap().id().clone();

        let report = ctl.grade(Grade::Easy).await.unwrap();
        assert_eq!(report.problem_id, first);
        assert!(report.persist_failure.is_none());
        assert!(matches!(report.advance, Advance::Next(_)));
        assert_eq!(ctl.progress().unwrap().cursor, 1);

        let stored = repo.load_progress().await.unwrap().unwrap();
        assert_eq!(stored.correct_count(&first), 1);
        assert_eq!(stored.stats().total_seen(), 1);
    }

    #[tokio::test]
    async fn grading_outside_session_changes_nothing() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut ctl = controller(repo.clone());
        let err = ctl.grade(Grade::Hard).await.unwrap_err();
        assert_eq!(err, SessionError::MissingCurrentProblem);
        assert_eq!(ctl.stats(), StreakStats::default());
        assert!(repo.raw_blob().unwrap().is_none());
    }

    #[tokio::test]
    async fn total_seen_grows_by_one_per_grade() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        ctl.start_session(PracticeMode::Random).unwrap();
        for (n, grade) in [Grade::Hard, Grade::Medium, Grade::Easy, Grade::Easy]
            .into_iter()
            .enumerate()
        {
            ctl.grade(grade).await.unwrap();
            assert_eq!(ctl.stats().total_seen(), n as u64 + 1);
        }
        assert_eq!(ctl.state(), SessionState::PassComplete);
        assert_eq!(ctl.stats().correct_streak(), 2);
    }

    #[tokio::test]
    async fn custom_filters_are_conjunctive() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        let filters = ProblemFilters::default()
            .with_difficulties([Difficulty::Hard])
            .with_max_hardness(3);
        let start = ctl.start_session(PracticeMode::Custom(filters)).unwrap();
        assert_eq!(start.total, 1);
        assert_eq!(start.first.id().as_str(), "2");
    }

    #[tokio::test]
    async fn empty_mistakes_leaves_controller_idle() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        let err = ctl.start_session(PracticeMode::Mistakes).unwrap_err();
        assert!(err.is_empty_selection());
        assert_eq!(ctl.state(), SessionState::Idle);
        assert!(!ctl.stopwatch().is_running());
    }

    #[tokio::test]
    async fn double_favorite_toggle_flips_once() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        ctl.start_session(PracticeMode::Random).unwrap();

        let first = ctl.toggle_favorite().await.unwrap();
        let second = ctl.toggle_favorite().await.unwrap();
        assert_eq!(first.value, FavoriteToggle::Added);
        assert_eq!(second.value, FavoriteToggle::Suppressed);
        assert!(ctl.is_favorite_current());

        ctl.clock_mut().advance(Duration::milliseconds(500));
        let third = ctl.toggle_favorite().await.unwrap();
        assert_eq!(third.value, FavoriteToggle::Removed);
        assert!(!ctl.is_favorite_current());
    }

    #[tokio::test]
    async fn write_failure_is_reported_without_rollback() {
        let mut ctl = controller(Arc::new(FailingRepository));
        ctl.start_session(PracticeMode::Random).unwrap();

        let report = ctl.grade(Grade::Hard).await.unwrap();
        assert!(matches!(
            report.persist_failure,
            Some(StorageError::Connection(_))
        ));
        assert!(ctl.history().is_mistake(&report.problem_id));

        let saved = ctl.save_note("two pointers").await.unwrap();
        assert!(!saved.is_persisted());
        assert_eq!(ctl.note_for_current(), Some("two pointers"));
    }

    #[tokio::test]
    async fn empty_note_clears_to_empty_string() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut ctl = controller(repo.clone());
        ctl.pick(ProblemId::new("4").unwrap()).unwrap();

        ctl.save_note("monotonic stack").await.unwrap();
        ctl.save_note("").await.unwrap();
        assert_eq!(ctl.note_for_current(), Some(""));

        let stored = repo.load_progress().await.unwrap().unwrap();
        assert_eq!(stored.note(&ProblemId::new("4").unwrap()), Some(""));
    }

    #[tokio::test]
    async fn continue_pass_reselects_mistakes() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        ctl.start_session(PracticeMode::Random).unwrap();
        while ctl.state() == SessionState::InSession {
            let hard = ctl.current_problem().unwrap().id().as_str() == "2";
            ctl.grade(if hard { Grade::Hard } else { Grade::Easy })
                .await
                .unwrap();
        }
        assert!(matches!(
            ctl.continue_pass(),
            Ok(SessionStart { pass: 2, total: 4, .. })
        ));

        // Pass 2 adds a second mistake; the mistakes pass that follows sees it.
        while ctl.state() == SessionState::InSession {
            let hard = ctl.current_problem().unwrap().id().as_str() == "3";
            ctl.grade(if hard { Grade::Hard } else { Grade::Easy })
                .await
                .unwrap();
        }
        ctl.return_to_menu();
        assert_eq!(ctl.start_session(PracticeMode::Mistakes).unwrap().total, 2);

        ctl.grade(Grade::Easy).await.unwrap();
        ctl.grade(Grade::Easy).await.unwrap();
        let next = ctl.continue_pass().unwrap();
        assert_eq!((next.pass, next.total), (2, 2));
        assert_eq!(ctl.mode(), Some(&PracticeMode::Mistakes));
    }

    #[tokio::test]
    async fn flip_and_stopwatch_reset_on_new_problem() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        assert!(!ctl.flip());

        ctl.start_session(PracticeMode::Random).unwrap();
        assert!(ctl.flip());
        ctl.clock_mut().advance(Duration::seconds(75));
        assert_eq!(ctl.elapsed_display(), "01:15");

        ctl.advance().unwrap();
        assert!(!ctl.is_flipped());
        assert_eq!(ctl.elapsed_display(), "00:00");

        ctl.return_to_menu();
        assert!(!ctl.stopwatch().is_running());
        assert!(ctl.current_problem().is_none());
    }

    #[tokio::test]
    async fn stopwatch_stops_at_pass_end_and_restarts_with_next_pass() {
        let mut ctl = controller(Arc::new(InMemoryRepository::new()));
        ctl.start_session(PracticeMode::Random).unwrap();
        while ctl.state() == SessionState::InSession {
            ctl.clock_mut().advance(Duration::seconds(20));
            ctl.grade(Grade::Easy).await.unwrap();
        }
        assert_eq!(ctl.state(), SessionState::PassComplete);
        assert!(!ctl.stopwatch().is_running());
        assert_eq!(ctl.elapsed_display(), "00:00");

        ctl.clock_mut().advance(Duration::seconds(90));
        assert_eq!(ctl.elapsed_display(), "00:00");
        assert!(!ctl.toggle_stopwatch());

        ctl.continue_pass().unwrap();
        assert!(ctl.stopwatch().is_running());
        assert_eq!(ctl.elapsed_display(), "00:00");
        ctl.clock_mut().advance(Duration::seconds(5));
        assert_eq!(ctl.elapsed_display(), "00:05");
    }

    #[tokio::test]
    async fn search_respects_settings() {
        let ctl = controller(Arc::new(InMemoryRepository::new()));
        assert!(ctl.search("p").is_empty());
        assert_eq!(ctl.search("problem").len(), 4);
    }

    #[tokio::test]
    async fn load_reports_unreadable_store() {
        let repo = Arc::new(InMemoryRepository::with_raw_blob("{broken"));
        let mut ctl = controller(repo);
        let notice = ctl.load().await;
        assert!(notice.is_some());
        assert_eq!(ctl.history(), &Progress::default());
    }
}
