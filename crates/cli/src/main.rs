// examkit CLI - multi-version exam normalization and item analysis

mod analyze;
mod exit_codes;
mod normalize;
mod validate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use examkit_config::{
    BlankPolicy, ConfigError, ScoreAdjustment, ScoreSource, Settings, SettingsLayer,
};

use exit_codes::{config_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "examkit")]
#[command(about = "Normalize shuffled exam versions and run item analysis")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file layered over the user settings file
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map every version's responses back to canonical question order
    #[command(after_help = "\
Examples:
  examkit normalize exam.toml -f v1.csv -f v2.csv -o normalized.csv
  examkit normalize exam.yml -f v1.csv v2.csv --json
  examkit normalize exam.toml -f v1.csv v2.csv --keep-blanks --missing-token NA")]
    Normalize {
        /// Exam configuration (.toml, .yml or .yaml)
        config: PathBuf,

        /// Raw response files, one per version in configuration order
        #[arg(long = "files", short = 'f', num_args = 1.., required = true, value_name = "CSV")]
        files: Vec<PathBuf>,

        /// Write the normalized table here (omit to only print the summary)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Token marking "no response" in raw files
        #[arg(long)]
        blank_token: Option<String>,

        /// Keep blank tokens verbatim instead of substituting the key value
        #[arg(long)]
        keep_blanks: bool,

        /// How unpermuted questions are deducted from raw scores
        #[arg(long, value_enum)]
        score_adjustment: Option<AdjustmentArg>,

        /// Cell text for questions a version does not carry
        #[arg(long)]
        missing_token: Option<String>,

        /// Print the per-version summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Item difficulty, discrimination and KR-20 reliability
    #[command(after_help = "\
Examples:
  examkit analyze normalized.csv
  examkit analyze normalized.csv --plot
  examkit analyze version1.csv --nskip 1 --marker 1
  examkit analyze normalized.csv --score-source raw-score --json")]
    Analyze {
        /// Response table (normalized output or a single-version raw file)
        infile: PathBuf,

        /// Leading question columns that only carry the version marker
        #[arg(long, value_name = "N")]
        nskip: Option<usize>,

        /// Expected value in every skip column
        #[arg(long)]
        marker: Option<String>,

        /// Where each student's total score comes from
        #[arg(long, value_enum)]
        score_source: Option<ScoreSourceArg>,

        /// Append a text histogram of the score distribution
        #[arg(long)]
        plot: bool,

        /// Print the report as a single JSON document
        #[arg(long, conflicts_with = "plot")]
        json: bool,
    },

    /// Check an exam configuration without reading any responses
    Validate {
        /// Exam configuration (.toml, .yml or .yaml)
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AdjustmentArg {
    PerVersion,
    LastVersion,
}

impl From<AdjustmentArg> for ScoreAdjustment {
    fn from(a: AdjustmentArg) -> Self {
        match a {
            AdjustmentArg::PerVersion => ScoreAdjustment::PerVersion,
            AdjustmentArg::LastVersion => ScoreAdjustment::LastVersion,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScoreSourceArg {
    Keyed,
    RawScore,
}

impl From<ScoreSourceArg> for ScoreSource {
    fn from(s: ScoreSourceArg) -> Self {
        match s {
            ScoreSourceArg::Keyed => ScoreSource::Keyed,
            ScoreSourceArg::RawScore => ScoreSource::RawScore,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };
    init_logging(cli.verbose);
    let settings_file = cli.settings.as_deref();

    let result = match cli.command {
        Commands::Normalize {
            config,
            files,
            out,
            blank_token,
            keep_blanks,
            score_adjustment,
            missing_token,
            json,
        } => {
            let flags = SettingsLayer {
                blank_token,
                blank_policy: keep_blanks.then_some(BlankPolicy::Keep),
                score_adjustment: score_adjustment.map(Into::into),
                missing_token,
                ..Default::default()
            };
            normalize::cmd_normalize(&config, &files, out.as_deref(), settings_file, flags, json)
        }
        Commands::Analyze {
            infile,
            nskip,
            marker,
            score_source,
            plot,
            json,
        } => {
            let flags = SettingsLayer {
                skip_columns: nskip,
                version_marker: marker,
                score_source: score_source.map(Into::into),
                ..Default::default()
            };
            analyze::cmd_analyze(&infile, settings_file, flags, plot, json)
        }
        Commands::Validate { config } => validate::cmd_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::UnsupportedFormat(_) => {
                Some("exam configurations must end in .toml, .yml or .yaml".to_string())
            }
            ConfigError::InvalidPermutation { .. } => {
                Some("perm lists zero-based choice indices, each used exactly once".to_string())
            }
            _ => None,
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Settings layers below the exam document: user file, then `--settings`.
fn base_layers(settings_file: Option<&Path>) -> Result<Vec<SettingsLayer>, CliError> {
    let mut layers = vec![SettingsLayer::load_user().map_err(CliError::config)?];
    if let Some(path) = settings_file {
        if !path.exists() {
            return Err(CliError::new(
                exit_codes::EXIT_IO,
                format!("settings file not found: {}", path.display()),
            ));
        }
        layers.push(SettingsLayer::load_file(path).map_err(CliError::config)?);
    }
    Ok(layers)
}

/// Resolve settings from the base layers, any document layers, then flags.
pub fn resolve_settings(
    settings_file: Option<&Path>,
    document: Option<SettingsLayer>,
    flags: SettingsLayer,
) -> Result<Settings, CliError> {
    let mut layers = base_layers(settings_file)?;
    layers.extend(document);
    layers.push(flags);
    let settings = Settings::resolve(layers);
    log::debug!("resolved settings: {settings:?}");
    Ok(settings)
}
