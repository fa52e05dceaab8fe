//! `examkit-config`: exam configuration and tool settings.
//!
//! The exam document describes every shuffled version of one exam: the slot
//! order and, per question, the choice permutation used to build it. Tool
//! settings are resolved separately as an ordered merge of typed layers.

pub mod error;
pub mod exam;
pub mod settings;

pub use error::ConfigError;
pub use exam::{
    ExamConfig, Permutation, QuestionDef, Slot, VersionSpec, IDENTITY_COLUMNS, MAX_CHOICES,
    PLACEHOLDER,
};
pub use settings::{BlankPolicy, ScoreAdjustment, ScoreSource, Settings, SettingsLayer};
