use thiserror::Error;

use crate::model::IDENTITY_COLUMNS;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Response file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Output could not be written.
    #[error("write error: {0}")]
    Write(#[source] std::io::Error),
    /// Files are matched to versions by position.
    #[error("{files} response file(s) given for {versions} configured version(s)")]
    FileCountMismatch { versions: usize, files: usize },
    /// The first data row (answer key) is absent.
    #[error("version '{version}': response file has no answer key row")]
    MissingAnswerKey { version: String },
    #[error("version '{version}': missing column '{column}'")]
    MissingColumn { version: String, column: String },
    #[error("version '{version}': header has {found} column(s), expected at least {}", IDENTITY_COLUMNS)]
    ShortHeader { version: String, found: usize },
}
