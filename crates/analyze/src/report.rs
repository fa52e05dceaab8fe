use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{AnalyzeError, DegenerateInput};
use crate::item::{Choice, ItemStatistic, Tally};
use crate::reliability::ExamStatistic;
use crate::score::ScoreSummary;
use crate::table::Cohort;

const RULE_WIDTH: usize = 90;

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub tool_version: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Complete analysis result. Only ever built when every statistic is defined.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub meta: ReportMeta,
    pub exam: ExamStatistic,
    pub items: Vec<ItemStatistic>,
}

/// Run both passes over an admitted cohort.
pub fn analyze(cohort: &Cohort) -> Result<AnalysisReport, AnalyzeError> {
    // Pass 1: total-score aggregates.
    let scores = ScoreSummary::from_scores(cohort.scores());
    let sig = scores.std_dev()?;
    let k = cohort.questions.len();
    if k < 2 {
        return Err(DegenerateInput::TooFewQuestions { found: k }.into());
    }
    if sig == 0.0 {
        return Err(DegenerateInput::ZeroVariance.into());
    }

    // Pass 2: per-question tabulation against the exam-wide sigma.
    let mut items = Vec::with_capacity(k);
    let mut pq = 0.0;
    for (q, qid) in cohort.questions.iter().enumerate() {
        let tally = Tally::from_cohort(cohort, q);
        let item = ItemStatistic::from_tally(qid, &tally, sig)?;
        pq += item.variance();
        items.push(item);
    }

    let exam = ExamStatistic::new(&scores, k, pq, cohort.rejected)?;

    Ok(AnalysisReport {
        meta: ReportMeta {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            source: None,
        },
        exam,
        items,
    })
}

impl AnalysisReport {
    /// Fixed-width item table followed by the summary block.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(RULE_WIDTH);

        let _ = write!(out, "{:>6} {:>3}", "Q", "N");
        for c in Choice::ALL {
            let _ = write!(out, " | {:^13}", c);
        }
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');

        for item in &self.items {
            let _ = write!(out, "{:<6} {:>3}", item.question, item.responses);
            for c in &item.choices {
                let _ = write!(out, " | {:>5.1}% {:>6.3}", c.percent, c.discrimination);
            }
            out.push('\n');
        }
        out.push_str(&rule);
        out.push('\n');

        let e = &self.exam;
        let _ = writeln!(
            out,
            "Students = {} ({} rejected), Questions = {}",
            e.students, e.rejected, e.questions
        );
        let _ = writeln!(
            out,
            "Average = {:5.2} +- {:4.2} = ({:4.1} +- {:3.1})%",
            e.mean,
            e.stderr_mean,
            e.mean_percent(),
            e.stderr_mean_percent()
        );
        let _ = writeln!(out, "Standard error of measurement = {:4.2}", e.stderr_measurement);
        let _ = writeln!(
            out,
            "Range = [{} - {}] = {} = {:4.2} stderrs ({:4.2} sigma)",
            e.max, e.min, e.range, e.range_stderr, e.range_sigma
        );
        let _ = writeln!(out, "KR20 = {:5.3}", e.kr20);
        out
    }
}
