//! `examkit-analyze`: classical test theory statistics.
//!
//! Two passes over an admitted cohort: the first aggregates total scores
//! (mean, standard deviation), the second tabulates every question against
//! that exam-wide standard deviation.

pub mod distribution;
pub mod error;
pub mod item;
pub mod reliability;
pub mod report;
pub mod score;
pub mod table;

pub use distribution::Distribution;
pub use error::{AnalyzeError, DegenerateInput};
pub use item::{Choice, ChoiceStatistic, ItemStatistic, Tally};
pub use reliability::{kr20, ExamStatistic};
pub use report::{analyze, AnalysisReport, ReportMeta};
pub use score::ScoreSummary;
pub use table::{admit, AnalyzeOptions, Cohort, ResponseTable, ScoredStudent, MAX_RAW_SCORE};
