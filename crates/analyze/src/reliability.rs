use serde::Serialize;

use crate::error::DegenerateInput;
use crate::score::ScoreSummary;

/// Kuder–Richardson 20: `(k/(k−1))·(1 − pq/sig²)`.
pub fn kr20(questions: usize, pq: f64, sig: f64) -> Result<f64, DegenerateInput> {
    if questions < 2 {
        return Err(DegenerateInput::TooFewQuestions { found: questions });
    }
    if sig == 0.0 {
        return Err(DegenerateInput::ZeroVariance);
    }
    let k = questions as f64;
    Ok((k / (k - 1.0)) * (1.0 - pq / (sig * sig)))
}

/// Whole-exam statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamStatistic {
    pub students: usize,
    pub rejected: usize,
    pub questions: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub kr20: f64,
    pub stderr_measurement: f64,
    pub stderr_mean: f64,
    pub min: i64,
    pub max: i64,
    pub range: i64,
    pub range_sigma: f64,
    pub range_stderr: f64,
}

impl ExamStatistic {
    /// `pq` is the summed item variance over all `questions`.
    pub fn new(
        scores: &ScoreSummary,
        questions: usize,
        pq: f64,
        rejected: usize,
    ) -> Result<Self, DegenerateInput> {
        let sig = scores.std_dev()?;
        let r20 = kr20(questions, pq, sig)?;
        if r20 >= 1.0 {
            return Err(DegenerateInput::ReliabilityAtCeiling { kr20: r20 });
        }
        let stderr = sig * (1.0 - r20).sqrt();
        let range = scores.range();

        Ok(Self {
            students: scores.count,
            rejected,
            questions,
            mean: scores.mean(),
            std_dev: sig,
            kr20: r20,
            stderr_measurement: stderr,
            stderr_mean: sig / (scores.count as f64).sqrt(),
            min: scores.min,
            max: scores.max,
            range,
            range_sigma: range as f64 / sig,
            range_stderr: range as f64 / stderr,
        })
    }

    pub fn mean_percent(&self) -> f64 {
        100.0 * self.mean / self.questions as f64
    }

    pub fn stderr_mean_percent(&self) -> f64 {
        100.0 * self.stderr_mean / self.questions as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kr20_by_hand() {
        // k = 2, pq = 0.4, sig² = 0.7
        let r = kr20(2, 0.4, 0.7f64.sqrt()).unwrap();
        assert!((r - 2.0 * (1.0 - 0.4 / 0.7)).abs() < 1e-12);
    }

    #[test]
    fn kr20_requires_two_questions() {
        assert_eq!(kr20(1, 0.1, 1.0), Err(DegenerateInput::TooFewQuestions { found: 1 }));
    }

    #[test]
    fn kr20_requires_variance() {
        assert_eq!(kr20(3, 0.1, 0.0), Err(DegenerateInput::ZeroVariance));
    }

    #[test]
    fn exam_statistic_derives_errors_and_range() {
        let scores = ScoreSummary::from_scores([2, 3, 3, 4, 4]);
        let exam = ExamStatistic::new(&scores, 2, 0.4, 0).unwrap();
        let sig = 0.7f64.sqrt();
        let r20 = 2.0 * (1.0 - 0.4 / 0.7);
        assert!((exam.kr20 - r20).abs() < 1e-12);
        assert!((exam.stderr_measurement - sig * (1.0 - r20).sqrt()).abs() < 1e-12);
        assert!((exam.stderr_mean - sig / 5f64.sqrt()).abs() < 1e-12);
        assert_eq!(exam.range, 2);
        assert!((exam.range_sigma - 2.0 / sig).abs() < 1e-12);
        assert!((exam.mean_percent() - 160.0).abs() < 1e-12);
    }

    #[test]
    fn reliability_at_ceiling_is_degenerate() {
        // Two perfectly correlated items over two students.
        let scores = ScoreSummary::from_scores([2, 0]);
        let err = ExamStatistic::new(&scores, 2, 0.5, 0).unwrap_err();
        assert!(matches!(err, DegenerateInput::ReliabilityAtCeiling { .. }));
    }
}
