//! `examkit-normalize`: permutation resolution across exam versions.
//!
//! Pure engine crate: receives the exam configuration and one parsed raw
//! response file per version, returns a table keyed by canonical question id.

pub mod canonical;
pub mod engine;
pub mod error;
pub mod model;

pub use canonical::{CanonicalQuestionMap, Placement};
pub use engine::{normalize, normalize_response, write_csv, NormalizeOptions};
pub use error::NormalizeError;
pub use model::{
    CanonicalResponse, NormalizedRecord, NormalizedTable, RawResponseFile, VersionSummary,
    IDENTITY_COLUMNS,
};
