use std::path::Path;

use examkit_config::{ScoreSource, Settings, IDENTITY_COLUMNS};

use crate::error::AnalyzeError;

/// Largest score magnitude read from a raw score column. Keeps score ranges
/// and sums exact (f64 mantissa, i128 accumulators).
pub const MAX_RAW_SCORE: i64 = 1 << 53;

/// A normalized (or single-version raw) response table.
#[derive(Debug, Clone)]
pub struct ResponseTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResponseTable {
    pub fn from_csv(csv_data: &str) -> Result<Self, AnalyzeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.len() < IDENTITY_COLUMNS {
            return Err(AnalyzeError::ShortHeader {
                found: headers.len(),
                expected: IDENTITY_COLUMNS,
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn load(path: &Path) -> Result<Self, AnalyzeError> {
        let csv_data = std::fs::read_to_string(path).map_err(|source| AnalyzeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv(&csv_data)
    }

    /// Every column after the identity prefix, skip columns included.
    pub fn question_columns(&self) -> &[String] {
        self.headers.get(IDENTITY_COLUMNS..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Leading question columns that only carry the version marker.
    pub skip_columns: usize,
    pub version_marker: String,
    pub score_source: ScoreSource,
    pub raw_score_column: String,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AnalyzeOptions {
    fn from(s: &Settings) -> Self {
        Self {
            skip_columns: s.skip_columns,
            version_marker: s.version_marker.clone(),
            score_source: s.score_source,
            raw_score_column: s.raw_score_column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredStudent {
    pub score: i64,
    /// Aligned with `Cohort::questions`.
    pub responses: Vec<String>,
}

/// Students admitted to the analysis.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    pub questions: Vec<String>,
    pub students: Vec<ScoredStudent>,
    /// Rows excluded by the version-marker check or an unreadable score.
    pub rejected: usize,
}

impl Cohort {
    pub fn scores(&self) -> impl Iterator<Item = i64> + '_ {
        self.students.iter().map(|s| s.score)
    }
}

/// Apply the version-marker admission check and compute each score.
pub fn admit(table: &ResponseTable, opts: &AnalyzeOptions) -> Result<Cohort, AnalyzeError> {
    let columns = table.question_columns();
    let skip = opts.skip_columns.min(columns.len());
    let questions = columns[skip..].to_vec();
    let first_scored = IDENTITY_COLUMNS + skip;

    let score_idx = match opts.score_source {
        ScoreSource::Keyed => None,
        ScoreSource::RawScore => Some(
            table.headers[..IDENTITY_COLUMNS]
                .iter()
                .position(|h| *h == opts.raw_score_column)
                .ok_or_else(|| AnalyzeError::MissingColumn(opts.raw_score_column.clone()))?,
        ),
    };

    let mut cohort = Cohort {
        questions,
        ..Default::default()
    };

    'rows: for (ri, row) in table.rows.iter().enumerate() {
        let line = ri + 2;
        for j in 0..skip {
            let marker = row.get(IDENTITY_COLUMNS + j).map(String::as_str).unwrap_or("");
            if marker != opts.version_marker {
                log::warn!(
                    "row {line}: wrong response for version number ('{marker}', expected '{}'), skipping student",
                    opts.version_marker
                );
                cohort.rejected += 1;
                continue 'rows;
            }
        }

        let responses: Vec<String> = (0..cohort.questions.len())
            .map(|q| row.get(first_scored + q).cloned().unwrap_or_default())
            .collect();

        let score = match score_idx {
            None => responses.iter().filter(|r| r.as_str() == "1").count() as i64,
            Some(idx) => {
                let cell = row.get(idx).map(String::as_str).unwrap_or("");
                match cell.trim().parse::<i64>() {
                    Ok(s) if s.unsigned_abs() <= MAX_RAW_SCORE as u64 => s,
                    Ok(_) => {
                        log::warn!("row {line}: score '{cell}' is out of range, skipping student");
                        cohort.rejected += 1;
                        continue;
                    }
                    Err(_) => {
                        log::warn!("row {line}: cannot parse score '{cell}', skipping student");
                        cohort.rejected += 1;
                        continue;
                    }
                }
            }
        };

        cohort.students.push(ScoredStudent { score, responses });
    }

    log::info!(
        "admitted {} student(s), rejected {}",
        cohort.students.len(),
        cohort.rejected
    );

    Ok(cohort)
}
