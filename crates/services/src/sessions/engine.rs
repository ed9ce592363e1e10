use chrono::{DateTime, Utc};
use std::fmt;

use drill_core::model::{Catalog, Grade, GradeEffect, PracticeMode, Problem, Progress};

use super::progress::SessionProgress;
use super::select::Selector;
use super::shuffle::Shuffler;
use crate::error::SessionError;

//
// ─── STATES AND OUTCOMES ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session; the menu is showing.
    Idle,
    /// A problem is current.
    InSession,
    /// Cursor reached the end of the working set.
    PassComplete,
}

/// Outcome of moving the cursor forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The next problem is now current.
    Next(Problem),
    /// Every problem of the pass has been shown.
    PassComplete { total: usize, pass: u32 },
}

/// Summary of a freshly established pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStart {
    pub mode: PracticeMode,
    pub total: usize,
    pub pass: u32,
    pub first: Problem,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

struct ActiveSession {
    mode: PracticeMode,
    working_set: Vec<Problem>,
    cursor: usize,
    pass: u32,
    graded_current: bool,
}

/// Session state machine: `Idle -> InSession -> PassComplete -> InSession | Idle`.
///
/// Pure in-memory logic. Persistence is the caller's job.
#[derive(Default)]
pub struct SessionEngine {
    active: Option<ActiveSession>,
}

impl SessionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::Idle,
            Some(s) if s.cursor < s.working_set.len() => SessionState::InSession,
            Some(_) => SessionState::PassComplete,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Option<&PracticeMode> {
        self.active.as_ref().map(|s| &s.mode)
    }

    #[must_use]
    pub fn current_problem(&self) -> Option<&Problem> {
        self.active.as_ref().and_then(|s| s.working_set.get(s.cursor))
    }

    #[must_use]
    pub fn working_set(&self) -> &[Problem] {
        self.active.as_ref().map_or(&[], |s| s.working_set.as_slice())
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.active.as_ref().map(|s| SessionProgress {
            cursor: s.cursor,
            total: s.working_set.len(),
            pass: s.pass,
            is_complete: s.cursor >= s.working_set.len(),
        })
    }

    /// Select a working set for `mode` and make its first problem current.
    ///
    /// On an empty selection the engine is left `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` when nothing matches or the single
    /// problem is unknown.
    pub fn start_session(
        &mut self,
        catalog: &Catalog,
        progress: &Progress,
        mode: PracticeMode,
        shuffler: &mut Shuffler,
    ) -> Result<SessionStart, SessionError> {
        self.begin_pass(catalog, progress, mode, 1, shuffler)
    }

    /// Start the next pass with the same mode and filters.
    ///
    /// Selection runs again, so the order is reshuffled and mistakes membership
    /// reflects grades from the pass just finished.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PassNotComplete` unless the pass is complete, or
    /// `SessionError::Selection` if nothing matches any more (engine goes `Idle`).
    pub fn continue_pass(
        &mut self,
        catalog: &Catalog,
        progress: &Progress,
        shuffler: &mut Shuffler,
    ) -> Result<SessionStart, SessionError> {
        if self.state() != SessionState::PassComplete {
            return Err(SessionError::PassNotComplete);
        }
        let Some(finished) = self.active.take() else {
            return Err(SessionError::PassNotComplete);
        };
        self.begin_pass(catalog, progress, finished.mode, finished.pass + 1, shuffler)
    }

    fn begin_pass(
        &mut self,
        catalog: &Catalog,
        progress: &Progress,
        mode: PracticeMode,
        pass: u32,
        shuffler: &mut Shuffler,
    ) -> Result<SessionStart, SessionError> {
        self.active = None;
        let working_set = Selector::select(catalog, progress, &mode, shuffler)?;
        let Some(first) = working_set.first().cloned() else {
            return Err(SessionError::MissingCurrentProblem);
        };
        let total = working_set.len();
        tracing::info!(mode = mode.label(), total, pass, "pass started");

        self.active = Some(ActiveSession {
            mode: mode.clone(),
            working_set,
            cursor: 0,
            pass,
            graded_current: false,
        });
        Ok(SessionStart {
            mode,
            total,
            pass,
            first,
        })
    }

    /// Apply a grade for the current problem to `progress`.
    ///
    /// Allowed once per cursor position; the caller advances afterwards.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MissingCurrentProblem` with no current problem,
    /// or `SessionError::AlreadyGraded` if this position was already graded.
    pub fn record_grade(
        &mut self,
        progress: &mut Progress,
        grade: Grade,
        at: DateTime<Utc>,
    ) -> Result<GradeEffect, SessionError> {
        let session = self
            .active
            .as_mut()
            .filter(|s| s.cursor < s.working_set.len())
            .ok_or(SessionError::MissingCurrentProblem)?;
        if session.graded_current {
            return Err(SessionError::AlreadyGraded);
        }
        let id = session.working_set[session.cursor].id();
        let effect = progress.apply_grade(id, grade, at);
        session.graded_current = true;
        tracing::debug!(problem = %effect.problem_id, grade = %grade, "problem graded");
        Ok(effect)
    }

    /// Move to the next problem, or to `PassComplete` at the end of the set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInSession` unless the engine is `InSession`.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        let session = self
            .active
            .as_mut()
            .filter(|s| s.cursor < s.working_set.len())
            .ok_or(SessionError::NotInSession)?;

        session.cursor += 1;
        session.graded_current = false;

        match session.working_set.get(session.cursor) {
            Some(next) => Ok(Advance::Next(next.clone())),
            None => {
                tracing::info!(
                    mode = session.mode.label(),
                    total = session.working_set.len(),
                    pass = session.pass,
                    "pass complete"
                );
                Ok(Advance::PassComplete {
                    total: session.working_set.len(),
                    pass: session.pass,
                })
            }
        }
    }

    /// Drop all ephemeral session state.
    pub fn return_to_menu(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("returned to menu");
        }
    }
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SessionEngine");
        s.field("state", &self.state());
        if let Some(active) = &self.active {
            s.field("mode", &active.mode.label())
                .field("working_set_len", &active.working_set.len())
                .field("cursor", &active.cursor)
                .field("pass", &active.pass);
        }
        s.finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
