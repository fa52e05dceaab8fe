use serde::Serialize;

use crate::error::DegenerateInput;

/// Running sums over total scores (first pass). Sums are kept in i128 so
/// any admitted i64 score squares without overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub sum: i128,
    pub sum_sq: i128,
    pub min: i64,
    pub max: i64,
}

impl ScoreSummary {
    pub fn from_scores(scores: impl IntoIterator<Item = i64>) -> Self {
        let mut summary = Self::default();
        for s in scores {
            summary.push(s);
        }
        summary
    }

    pub fn push(&mut self, score: i64) {
        if self.count == 0 {
            self.min = score;
            self.max = score;
        } else {
            self.min = self.min.min(score);
            self.max = self.max.max(score);
        }
        self.count += 1;
        let wide = i128::from(score);
        self.sum += wide;
        self.sum_sq += wide * wide;
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }

    /// Sample standard deviation, `sqrt((n·Σx² − (Σx)²) / (n·(n−1)))`.
    pub fn std_dev(&self) -> Result<f64, DegenerateInput> {
        if self.count < 2 {
            return Err(DegenerateInput::TooFewStudents { found: self.count });
        }
        let n = self.count as i128;
        // Exact in integers; only the final division is floating point.
        let numerator = n * self.sum_sq - self.sum.pow(2);
        Ok((numerator as f64 / (n * (n - 1)) as f64).sqrt())
    }

    pub fn range(&self) -> i64 {
        self.max - self.min
    }
}
