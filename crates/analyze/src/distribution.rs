//! Text rendering of the score distribution (presentation only).

use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// `(score, students)` for every integer score in `[0, max_score]`,
    /// plus one bin per occurring score outside it.
    pub bins: Vec<(i64, usize)>,
    /// 25th, 50th and 75th percentiles.
    pub quartiles: [f64; 3],
    pub mean: f64,
    /// Mean ± half the standard error of measurement.
    pub band: (f64, f64),
}

impl Distribution {
    /// Empty bins are only laid out over `[0, max_score]`; outliers get a
    /// bin of their own rather than widening the span.
    pub fn new(scores: &[i64], max_score: i64, mean: f64, stderr: f64) -> Self {
        let mut counts: BTreeMap<i64, usize> = (0..=max_score.max(0)).map(|b| (b, 0)).collect();
        for &s in scores {
            *counts.entry(s).or_insert(0) += 1;
        }
        let bins = counts.into_iter().collect();

        let mut sorted = scores.to_vec();
        sorted.sort_unstable();

        Self {
            bins,
            quartiles: [
                percentile(&sorted, 25.0),
                percentile(&sorted, 50.0),
                percentile(&sorted, 75.0),
            ],
            mean,
            band: (mean - 0.5 * stderr, mean + 0.5 * stderr),
        }
    }

    /// Horizontal histogram with bars at most `width` characters long.
    pub fn render(&self, width: usize) -> String {
        let tallest = self.bins.iter().map(|&(_, n)| n).max().unwrap_or(0);
        let mean_bin = self.mean.round() as i64;
        let mut out = String::new();

        for &(score, n) in &self.bins {
            let len = if tallest == 0 {
                0
            } else {
                (n * width).div_ceil(tallest)
            };
            let _ = write!(out, "{score:>4} | {:<width$} {n:>3}", "#".repeat(len));
            if score == mean_bin {
                out.push_str("  <- mean");
            }
            out.push('\n');
        }

        let [q1, q2, q3] = self.quartiles;
        let _ = writeln!(out, "Q1 = {q1:.2}, median = {q2:.2}, Q3 = {q3:.2}");
        let _ = writeln!(
            out,
            "mean = {:.2}, band = [{:.2}, {:.2}]",
            self.mean, self.band.0, self.band.1
        );
        out
    }
}

/// Linear-interpolation percentile over sorted data.
fn percentile(sorted: &[i64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0] as f64,
        n => {
            let pos = p / 100.0 * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
        }
    }
}
