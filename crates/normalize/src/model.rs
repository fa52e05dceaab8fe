use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::NormalizeError;

pub use examkit_config::IDENTITY_COLUMNS;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One version's response export: header plus every data row.
/// Row 0 is the answer key; the remaining rows are students.
#[derive(Debug, Clone)]
pub struct RawResponseFile {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    columns: HashMap<String, usize>,
}

impl RawResponseFile {
    pub fn from_csv(csv_data: &str) -> Result<Self, NormalizeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self::new(headers, rows))
    }

    pub fn load(path: &Path) -> Result<Self, NormalizeError> {
        let csv_data = std::fs::read_to_string(path).map_err(|source| NormalizeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv(&csv_data)
    }

    /// Index the header; a repeated name resolves to its first column.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut columns = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            if let Some(first) = columns.get(h) {
                log::warn!("duplicate column '{h}' at {}; using column {}", i + 1, first + 1);
                continue;
            }
            columns.insert(h.clone(), i);
        }
        Self { headers, rows, columns }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A student's answer to one canonical question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalResponse {
    /// 1-based canonical choice; "1" is always the keyed answer.
    Choice(usize),
    /// Token that could not be remapped, kept verbatim.
    Literal(String),
    /// The student's version does not carry this question.
    Missing,
}

impl CanonicalResponse {
    /// Cell text, writing `Missing` as `missing_token`.
    pub fn to_field(&self, missing_token: &str) -> String {
        match self {
            Self::Choice(c) => c.to_string(),
            Self::Literal(s) => s.clone(),
            Self::Missing => missing_token.to_string(),
        }
    }
}

impl fmt::Display for CanonicalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(c) => write!(f, "{c}"),
            Self::Literal(s) => write!(f, "{s}"),
            Self::Missing => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    /// Identity columns; the raw score cell already holds the adjusted score.
    pub identity: Vec<String>,
    pub raw_score: i64,
    /// Aligned with `NormalizedTable::questions`.
    pub responses: Vec<CanonicalResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub version: String,
    pub students: usize,
    pub dropped_rows: usize,
    pub skipped_from_scoring: usize,
    pub score_deduction: usize,
    pub canonical_questions: usize,
}

#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub identity_headers: Vec<String>,
    /// Canonical question ids in output order.
    pub questions: Vec<String>,
    pub records: Vec<NormalizedRecord>,
    pub versions: Vec<VersionSummary>,
}

impl NormalizedTable {
    pub fn header(&self) -> Vec<String> {
        self.identity_headers
            .iter()
            .chain(self.questions.iter())
            .cloned()
            .collect()
    }

    pub fn response(&self, record: usize, qid: &str) -> Option<&CanonicalResponse> {
        let q = self.questions.iter().position(|q| q == qid)?;
        self.records.get(record)?.responses.get(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_raw_file_keeps_key_row_first() {
        let csv = "\
CWID,Mybama ID,Student Name,Raw Score,Blank,1,2
,,,,,1,3
111,aa,Ann,2,,1,3
222,bb,Bob,1,,2,3
";
        let file = RawResponseFile::from_csv(csv).unwrap();
        assert_eq!(file.headers.len(), 7);
        assert_eq!(file.rows.len(), 3);
        assert_eq!(file.rows[0][5], "1");
        assert_eq!(file.column("2"), Some(6));
        assert_eq!(file.column("3"), None);
    }

    #[test]
    fn duplicate_header_resolves_to_first_column() {
        let csv = "\
CWID,Mybama ID,Student Name,Raw Score,Blank,1,2,1
,,,,,1,3,4
";
        let file = RawResponseFile::from_csv(csv).unwrap();
        assert_eq!(file.column("1"), Some(5));
        assert_eq!(file.column("2"), Some(6));
    }

    #[test]
    fn ragged_rows_are_accepted() {
        let csv = "a,b,c,d,e,1\n,,,,,1\n1,2,3\n";
        let file = RawResponseFile::from_csv(csv).unwrap();
        assert_eq!(file.rows[1].len(), 3);
    }

    #[test]
    fn missing_response_uses_token() {
        assert_eq!(CanonicalResponse::Missing.to_field("NA"), "NA");
        assert_eq!(CanonicalResponse::Choice(3).to_field("NA"), "3");
        assert_eq!(CanonicalResponse::Literal("*".into()).to_string(), "*");
    }
}
