//! `examkit analyze`: item statistics and KR-20 over a response table.

use std::path::Path;

use examkit_analyze::{admit, analyze, AnalyzeError, AnalyzeOptions, Distribution, ResponseTable};
use examkit_config::SettingsLayer;

use crate::exit_codes::analyze_exit_code;
use crate::{resolve_settings, CliError};

const PLOT_WIDTH: usize = 50;

fn analyze_err(err: AnalyzeError) -> CliError {
    let hint = match &err {
        AnalyzeError::MissingColumn(_) => Some("use --score-source keyed to count keyed answers instead"),
        AnalyzeError::Degenerate(_) => Some("check --nskip and --marker; rejected students are logged with -v"),
        _ => None,
    };
    let cli = CliError::new(analyze_exit_code(&err), err.to_string());
    match hint {
        Some(h) => cli.with_hint(h),
        None => cli,
    }
}

pub fn cmd_analyze(
    infile: &Path,
    settings_file: Option<&Path>,
    flags: SettingsLayer,
    plot: bool,
    json: bool,
) -> Result<(), CliError> {
    let settings = resolve_settings(settings_file, None, flags)?;
    let opts = AnalyzeOptions::from(&settings);

    let table = ResponseTable::load(infile).map_err(analyze_err)?;
    let cohort = admit(&table, &opts).map_err(analyze_err)?;
    log::info!(
        "{} student(s) admitted, {} rejected, {} question(s)",
        cohort.students.len(),
        cohort.rejected,
        cohort.questions.len()
    );

    let mut report = analyze(&cohort).map_err(analyze_err)?;
    report.meta.source = Some(infile.display().to_string());

    // Fully rendered before anything reaches stdout.
    let output = if json {
        let mut text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        text.push('\n');
        text
    } else {
        let mut text = report.render_text();
        if plot {
            let scores: Vec<i64> = cohort.scores().collect();
            let dist = Distribution::new(
                &scores,
                report.exam.questions as i64,
                report.exam.mean,
                report.exam.stderr_measurement,
            );
            text.push('\n');
            text.push_str(&dist.render(PLOT_WIDTH));
        }
        text
    };
    print!("{output}");
    Ok(())
}
