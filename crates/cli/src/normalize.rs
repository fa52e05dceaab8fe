//! `examkit normalize`: per-version raw files into one canonical table.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use examkit_config::{ExamConfig, SettingsLayer};
use examkit_normalize::{
    normalize, write_csv, CanonicalQuestionMap, NormalizeError, NormalizeOptions, RawResponseFile,
    VersionSummary,
};
use serde::Serialize;

use crate::exit_codes::{normalize_exit_code, EXIT_IO};
use crate::{resolve_settings, CliError};

fn normalize_err(err: NormalizeError) -> CliError {
    let hint = match &err {
        NormalizeError::FileCountMismatch { .. } => {
            Some("pass one response file per version, in configuration order")
        }
        NormalizeError::MissingAnswerKey { .. } => {
            Some("the first data row of each response file must be the answer key")
        }
        _ => None,
    };
    let cli = CliError::new(normalize_exit_code(&err), err.to_string());
    match hint {
        Some(h) => cli.with_hint(h),
        None => cli,
    }
}

#[derive(Serialize)]
struct NormalizeSummary<'a> {
    tool_version: &'static str,
    generated_at: String,
    config: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    canonical_questions: usize,
    records: usize,
    versions: &'a [VersionSummary],
}

pub fn cmd_normalize(
    config_path: &Path,
    files: &[PathBuf],
    out: Option<&Path>,
    settings_file: Option<&Path>,
    flags: SettingsLayer,
    json: bool,
) -> Result<(), CliError> {
    let config = ExamConfig::load(config_path).map_err(CliError::config)?;
    let settings = resolve_settings(settings_file, Some(config.settings.clone()), flags)?;
    let map = CanonicalQuestionMap::build(&config);
    log::info!(
        "{} version(s), {} canonical question(s)",
        map.versions().len(),
        map.len()
    );

    let raw = files
        .iter()
        .map(|path| RawResponseFile::load(path))
        .collect::<Result<Vec<_>, _>>()
        .map_err(normalize_err)?;

    let table = normalize(&map, &raw, &NormalizeOptions::from(&settings)).map_err(normalize_err)?;

    if let Some(path) = out {
        let file = File::create(path).map_err(|e| {
            CliError::new(EXIT_IO, format!("cannot create {}: {e}", path.display()))
        })?;
        write_csv(&table, BufWriter::new(file), &settings.missing_token).map_err(normalize_err)?;
        eprintln!("wrote {} record(s) to {}", table.records.len(), path.display());
    }

    if json {
        let summary = NormalizeSummary {
            tool_version: env!("CARGO_PKG_VERSION"),
            generated_at: chrono::Utc::now().to_rfc3339(),
            config: config_path.display().to_string(),
            output: out.map(|p| p.display().to_string()),
            canonical_questions: table.questions.len(),
            records: table.records.len(),
            versions: &table.versions,
        };
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", render_summary(&table.versions, table.questions.len()));
    }
    Ok(())
}

fn render_summary(versions: &[VersionSummary], canonical: usize) -> String {
    let mut out = String::new();
    for v in versions {
        out.push_str(&format!(
            "version {}: {} student(s), {} of {} canonical question(s), {} skipped from scoring (raw score -{})\n",
            v.version,
            v.students,
            v.canonical_questions,
            canonical,
            v.skipped_from_scoring,
            v.score_deduction,
        ));
        if v.dropped_rows > 0 {
            out.push_str(&format!("  {} unreadable row(s) dropped\n", v.dropped_rows));
        }
    }
    out
}
