use std::collections::HashMap;

use thiserror::Error;

use crate::model::ids::ProblemId;
use crate::model::problem::Problem;

/// Maximum number of matches returned by `Catalog::search`.
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Search terms shorter than this (after trimming) match nothing.
pub const SEARCH_MIN_TERM_LEN: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate problem id: {0}")]
    DuplicateId(ProblemId),
}

/// Ordered, immutable universe of practice problems.
///
/// Catalog order is preserved everywhere it is observable (search results,
/// selection candidates before shuffling).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    problems: Vec<Problem>,
    index: HashMap<ProblemId, usize>,
}

impl Catalog {
    /// Build a catalog from problems in their source order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two problems share an id.
    pub fn new(problems: Vec<Problem>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(problems.len());
        for (pos, problem) in problems.iter().enumerate() {
            if index.insert(problem.id().clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(problem.id().clone()));
            }
        }
        Ok(Self { problems, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    /// Look up a problem by id. Ids from an older catalog simply miss.
    #[must_use]
    pub fn get(&self, id: &ProblemId) -> Option<&Problem> {
        self.index.get(id).map(|&pos| &self.problems[pos])
    }

    /// Case-insensitive match on name, substring match on id.
    ///
    /// Returns at most `SEARCH_RESULT_LIMIT` problems in catalog order.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Problem> {
        self.search_with(term, SEARCH_MIN_TERM_LEN, SEARCH_RESULT_LIMIT)
    }

    /// `search` with explicit term length floor and result cap.
    #[must_use]
    pub fn search_with(&self, term: &str, min_term_len: usize, limit: usize) -> Vec<&Problem> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() || needle.chars().count() < min_term_len {
            return Vec::new();
        }
        self.problems
            .iter()
            .filter(|problem| {
                problem.name().to_lowercase().contains(&needle)
                    || problem.id().as_str().to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProblemDraft;

    fn problem(id: &str, name: &str) -> Problem {
        ProblemDraft {
            id: id.into(),
            name: name.into(),
            difficulty: "Medium".into(),
            frequency: "10".into(),
            hardness_rating: "3".into(),
            ..ProblemDraft::default()
        }
        .validate()
        .unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            problem("1", "Two Sum"),
            problem("15", "3Sum"),
            problem("16", "3Sum Closest"),
            problem("18", "4Sum"),
            problem("167", "Two Sum II"),
            problem("454", "4Sum II"),
            problem("560", "Subarray Sum Equals K"),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::new(vec![problem("1", "A"), problem("1", "B")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId(ProblemId::new("1").unwrap()));
    }

    #[test]
    fn lookup_by_id() {
        let catalog = catalog();
        let id = ProblemId::new("454").unwrap();
        assert_eq!(catalog.get(&id).unwrap().name(), "4Sum II");
        assert!(catalog.get(&ProblemId::new("9999").unwrap()).is_none());
    }

    #[test]
    fn search_matches_name_case_insensitively_and_caps_results() {
        let catalog = catalog();
        let names: Vec<_> = catalog.search("SUM").iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Two Sum", "3Sum", "3Sum Closest", "4Sum", "Two Sum II"]);
    }

    #[test]
    fn search_matches_id_substring() {
        let catalog = catalog();
        let ids: Vec<_> = catalog
            .search("16")
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["16", "167"]);
    }

    #[test]
    fn short_terms_match_nothing() {
        let catalog = catalog();
        assert!(catalog.search("1").is_empty());
        assert!(catalog.search("  ").is_empty());
    }

    #[test]
    fn search_with_custom_cap() {
        let catalog = catalog();
        assert_eq!(catalog.search_with("sum", 2, 2).len(), 2);
        assert_eq!(catalog.search_with("1", 1, 10).len(), 5);
    }
}
