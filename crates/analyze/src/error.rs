use thiserror::Error;

/// Inputs for which the statistics are mathematically undefined.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegenerateInput {
    #[error("need at least 2 admitted students, found {found}")]
    TooFewStudents { found: usize },
    #[error("need at least 2 questions, found {found}")]
    TooFewQuestions { found: usize },
    #[error("total scores have zero variance")]
    ZeroVariance,
    #[error("question '{question}' has {found} classifiable response(s), need at least 2")]
    TooFewResponses { question: String, found: usize },
    #[error("KR-20 of {kr20:.3} leaves no measurement error to scale the range by")]
    ReliabilityAtCeiling { kr20: f64 },
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("header has {found} column(s), expected at least {expected}")]
    ShortHeader { found: usize, expected: usize },
    #[error("degenerate input: {0}")]
    Degenerate(#[from] DegenerateInput),
}
