use drill_core::model::{Catalog, PracticeMode, Problem, Progress};

use super::shuffle::Shuffler;
use crate::error::SelectionError;

/// Maps catalog + progress + mode to a working set.
pub struct Selector;

impl Selector {
    /// Problems eligible for `mode`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownProblem` when a single-problem mode
    /// names an id missing from the catalog.
    pub fn candidates<'a>(
        catalog: &'a Catalog,
        progress: &Progress,
        mode: &PracticeMode,
    ) -> Result<Vec<&'a Problem>, SelectionError> {
        let picked = match mode {
            PracticeMode::Random => catalog.iter().collect(),
            PracticeMode::Mistakes => catalog
                .iter()
                .filter(|problem| progress.is_mistake(problem.id()))
                .collect(),
            PracticeMode::Custom(filters) => catalog
                .iter()
                .filter(|problem| filters.matches(problem))
                .filter(|problem| !filters.favorites_only || progress.is_favorite(problem.id()))
                .collect(),
            PracticeMode::Single(id) => {
                let problem = catalog
                    .get(id)
                    .ok_or_else(|| SelectionError::UnknownProblem(id.clone()))?;
                vec![problem]
            }
        };
        Ok(picked)
    }

    /// Build the ordered working set for one pass.
    ///
    /// Every mode except `Single` is shuffled once; the pass then visits each
    /// selected problem exactly once.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::EmptySelection` when nothing matches, and
    /// `SelectionError::UnknownProblem` as in [`Selector::candidates`].
    pub fn select(
        catalog: &Catalog,
        progress: &Progress,
        mode: &PracticeMode,
        shuffler: &mut Shuffler,
    ) -> Result<Vec<Problem>, SelectionError> {
        let mut working_set: Vec<Problem> = Self::candidates(catalog, progress, mode)?
            .into_iter()
            .cloned()
            .collect();

        if working_set.is_empty() {
            return Err(SelectionError::EmptySelection { mode: mode.label() });
        }
        if mode.is_shuffled() {
            shuffler.shuffle(&mut working_set);
        }

        tracing::debug!(mode = mode.label(), size = working_set.len(), "working set selected");
        Ok(working_set)
    }
}
