// Tool settings
// Resolved as an ordered merge: defaults < ~/.config/examkit/settings.toml
// < --settings file < [settings] in the exam document < command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// What to do with a response equal to the blank marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankPolicy {
    /// Substitute the answer key's value at the same column (legacy grading).
    #[default]
    AnswerKey,
    /// Pass the blank marker through unchanged.
    Keep,
}

/// Which skipped-from-scoring count is deducted from raw scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAdjustment {
    /// Each file is adjusted by its own version's count.
    #[default]
    PerVersion,
    /// Every file is adjusted by the last configured version's count.
    LastVersion,
}

/// Where the analyzer takes each student's total score from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Count of scored responses equal to the keyed choice "1".
    #[default]
    Keyed,
    /// The table's raw score column.
    RawScore,
}

/// One layer of partially specified settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsLayer {
    pub blank_token: Option<String>,
    pub blank_policy: Option<BlankPolicy>,
    pub score_adjustment: Option<ScoreAdjustment>,
    pub missing_token: Option<String>,
    pub raw_score_column: Option<String>,
    pub skip_columns: Option<usize>,
    pub version_marker: Option<String>,
    pub score_source: Option<ScoreSource>,
}

impl SettingsLayer {
    /// Overlay `over` on top of `self`; fields set in `over` win.
    pub fn merge(self, over: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            blank_token: over.blank_token.or(self.blank_token),
            blank_policy: over.blank_policy.or(self.blank_policy),
            score_adjustment: over.score_adjustment.or(self.score_adjustment),
            missing_token: over.missing_token.or(self.missing_token),
            raw_score_column: over.raw_score_column.or(self.raw_score_column),
            skip_columns: over.skip_columns.or(self.skip_columns),
            version_marker: over.version_marker.or(self.version_marker),
            score_source: over.score_source.or(self.score_source),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Per-user settings file location.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("examkit").join("settings.toml"))
    }

    /// Load a settings file. A missing file is an empty layer.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(input) => {
                log::debug!("loaded settings from {}", path.display());
                Self::from_toml(&input)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn load_user() -> Result<Self, ConfigError> {
        match Self::user_path() {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub blank_token: String,
    pub blank_policy: BlankPolicy,
    pub score_adjustment: ScoreAdjustment,
    pub missing_token: String,
    pub raw_score_column: String,
    pub skip_columns: usize,
    pub version_marker: String,
    pub score_source: ScoreSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blank_token: ".".into(),
            blank_policy: BlankPolicy::AnswerKey,
            score_adjustment: ScoreAdjustment::PerVersion,
            missing_token: String::new(),
            raw_score_column: "Raw Score".into(),
            skip_columns: 0,
            version_marker: "1".into(),
            score_source: ScoreSource::Keyed,
        }
    }
}

impl Settings {
    /// Merge `layers` in order (earliest lowest) over the defaults.
    pub fn resolve(layers: impl IntoIterator<Item = SettingsLayer>) -> Settings {
        let merged = layers
            .into_iter()
            .fold(SettingsLayer::default(), SettingsLayer::merge);
        let d = Settings::default();
        Settings {
            blank_token: merged.blank_token.unwrap_or(d.blank_token),
            blank_policy: merged.blank_policy.unwrap_or(d.blank_policy),
            score_adjustment: merged.score_adjustment.unwrap_or(d.score_adjustment),
            missing_token: merged.missing_token.unwrap_or(d.missing_token),
            raw_score_column: merged.raw_score_column.unwrap_or(d.raw_score_column),
            skip_columns: merged.skip_columns.unwrap_or(d.skip_columns),
            version_marker: merged.version_marker.unwrap_or(d.version_marker),
            score_source: merged.score_source.unwrap_or(d.score_source),
        }
    }
}
