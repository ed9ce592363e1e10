//! Tab-separated catalog loader.
//!
//! The first line names the columns; every following line is one problem.
//! Columns are matched by trimmed header name, so their order does not matter.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use drill_core::model::{Catalog, CatalogError, ProblemDraft, ProblemError};
use thiserror::Error;

pub const COL_ID: &str = "Leetcode Id";
pub const COL_NAME: &str = "Name";
pub const COL_LINK: &str = "Link";
pub const COL_ANSWER: &str = "Answer";
pub const COL_COMPLEXITY: &str = "Complexity";
pub const COL_DIFFICULTY: &str = "Difficulty";
pub const COL_FREQUENCY: &str = "Frequency";
pub const COL_HARDNESS: &str = "Hardness rating";

const REQUIRED_COLUMNS: [&str; 8] = [
    COL_ID,
    COL_NAME,
    COL_LINK,
    COL_ANSWER,
    COL_COMPLEXITY,
    COL_DIFFICULTY,
    COL_FREQUENCY,
    COL_HARDNESS,
];

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to open catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog: {0}")]
    Tsv(#[from] csv::Error),

    #[error("catalog is missing column `{0}`")]
    MissingColumn(&'static str),

    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: ProblemError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Load and validate a catalog file.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the file cannot be read, a column is
/// missing, a row fails validation, or ids repeat.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogLoadError> {
    let file = File::open(path.as_ref())?;
    let catalog = parse_catalog(file)?;
    tracing::info!(
        path = %path.as_ref().display(),
        problems = catalog.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Parse a catalog from any reader.
///
/// # Errors
///
/// See [`load_catalog`].
pub fn parse_catalog(reader: impl Read) -> Result<Catalog, CatalogLoadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(pos, name)| (name.trim().to_owned(), pos))
        .collect();

    let mut columns = HashMap::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        let pos = headers
            .get(name)
            .copied()
            .ok_or(CatalogLoadError::MissingColumn(name))?;
        columns.insert(name, pos);
    }

    let mut problems = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let field = |name: &'static str| cell(&record, columns[&name]);
        let draft = ProblemDraft {
            id: field(COL_ID),
            name: field(COL_NAME),
            link: field(COL_LINK),
            answer: field(COL_ANSWER),
            complexity: field(COL_COMPLEXITY),
            difficulty: field(COL_DIFFICULTY),
            frequency: field(COL_FREQUENCY),
            hardness_rating: field(COL_HARDNESS),
        };
        let problem = draft
            .validate()
            .map_err(|source| CatalogLoadError::InvalidRow { row: idx + 1, source })?;
        problems.push(problem);
    }

    Ok(Catalog::new(problems)?)
}

fn cell(record: &StringRecord, pos: usize) -> String {
    record.get(pos).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{Difficulty, ProblemId};

    const HEADER: &str =
        "Leetcode Id\tName\tLink\tAnswer\tComplexity\tDifficulty\tFrequency\tHardness rating";

    #[test]
    fn parses_rows_in_order() {
        let tsv = format!(
            "{HEADER}\n\
             1\tTwo Sum\thttps://leetcode.com/problems/two-sum\tUse a \"seen\" map\tO(n)\tEasy\t92.1\t1\n\
             42\tTrapping Rain Water\thttps://leetcode.com/problems/trapping-rain-water\tTwo pointers\tO(n)\tHard\t75\t4\n"
        );
        let catalog = parse_catalog(tsv.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        let trap = catalog.get(&ProblemId::new("42").unwrap()).unwrap();
        assert_eq!(trap.difficulty(), Difficulty::Hard);
        assert_eq!(trap.hardness_rating(), 4);
        assert_eq!(catalog.problems()[0].answer(), "Use a \"seen\" map");
    }

    #[test]
    fn column_order_is_free() {
        let tsv = "Name\tLeetcode Id\tDifficulty\tFrequency\tHardness rating\tLink\tAnswer\tComplexity\n\
                   Valid Anagram\t242\tEasy\t40\t1\t\tCount letters\tO(n)\n";
        let catalog = parse_catalog(tsv.as_bytes()).unwrap();
        assert_eq!(catalog.problems()[0].id().as_str(), "242");
    }

    #[test]
    fn missing_column_is_reported() {
        let tsv = "Leetcode Id\tName\n1\tTwo Sum\n";
        let err = parse_catalog(tsv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogLoadError::MissingColumn(COL_LINK)));
    }

    #[test]
    fn invalid_row_names_its_position() {
        let tsv = format!("{HEADER}\n1\tTwo Sum\t\t\t\tEasy\t1\t1\n2\tAdd Two Numbers\t\t\t\tMedium\tlots\t2\n");
        let err = parse_catalog(tsv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CatalogLoadError::InvalidRow {
                row: 2,
                source: ProblemError::InvalidFrequency(_)
            }
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tsv = format!("{HEADER}\n1\tA\t\t\t\tEasy\t1\t1\n1\tB\t\t\t\tEasy\t1\t1\n");
        let err = parse_catalog(tsv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogLoadError::Catalog(CatalogError::DuplicateId(_))));
    }
}
