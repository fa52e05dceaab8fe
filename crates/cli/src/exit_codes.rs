//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 1    | General error (unspecified)                                  |
//! | 2    | Usage error (bad arguments, file count does not match)       |
//! | 3    | Invalid exam configuration or settings file                  |
//! | 4    | I/O failure reading inputs or writing outputs                |
//! | 5    | Malformed response file (CSV, header, missing column or key) |
//! | 6    | Degenerate input: statistics are mathematically undefined    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the error mapping below

use examkit_analyze::AnalyzeError;
use examkit_config::ConfigError;
use examkit_normalize::NormalizeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, wrong number of response files.
pub const EXIT_USAGE: u8 = 2;

/// Exam configuration or settings file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A file could not be read or written.
pub const EXIT_IO: u8 = 4;

/// A response file is not shaped like a response file.
pub const EXIT_MALFORMED_INPUT: u8 = 5;

/// Too few students or questions, zero variance, or KR-20 at its ceiling.
pub const EXIT_DEGENERATE: u8 = 6;

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io { .. } => EXIT_IO,
        _ => EXIT_INVALID_CONFIG,
    }
}

pub fn normalize_exit_code(err: &NormalizeError) -> u8 {
    match err {
        NormalizeError::Io { .. } | NormalizeError::Write(_) => EXIT_IO,
        NormalizeError::FileCountMismatch { .. } => EXIT_USAGE,
        NormalizeError::Csv(_)
        | NormalizeError::MissingAnswerKey { .. }
        | NormalizeError::MissingColumn { .. }
        | NormalizeError::ShortHeader { .. } => EXIT_MALFORMED_INPUT,
    }
}

pub fn analyze_exit_code(err: &AnalyzeError) -> u8 {
    match err {
        AnalyzeError::Io { .. } => EXIT_IO,
        AnalyzeError::Csv(_) | AnalyzeError::MissingColumn(_) | AnalyzeError::ShortHeader { .. } => {
            EXIT_MALFORMED_INPUT
        }
        AnalyzeError::Degenerate(_) => EXIT_DEGENERATE,
    }
}
