use std::fmt;

use serde::Serialize;

use crate::error::DegenerateInput;
use crate::table::Cohort;

/// Response bucket. After normalization `A` is always the keyed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
    E,
}

impl Choice {
    pub const ALL: [Choice; 5] = [Choice::A, Choice::B, Choice::C, Choice::D, Choice::E];

    /// Classify a response cell; anything outside "1".."5" is `None`.
    pub fn from_response(response: &str) -> Option<Choice> {
        match response {
            "1" => Some(Choice::A),
            "2" => Some(Choice::B),
            "3" => Some(Choice::C),
            "4" => Some(Choice::D),
            "5" => Some(Choice::E),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        };
        f.pad(label)
    }
}

/// Per-bucket response counts and score sums for one question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub counts: [usize; 5],
    pub sums: [i128; 5],
}

impl Tally {
    pub fn from_cohort(cohort: &Cohort, question: usize) -> Self {
        let mut tally = Self::default();
        for student in &cohort.students {
            if let Some(choice) = student
                .responses
                .get(question)
                .and_then(|r| Choice::from_response(r))
            {
                tally.add(choice, student.score);
            }
        }
        tally
    }

    pub fn add(&mut self, choice: Choice, score: i64) {
        self.counts[choice.index()] += 1;
        self.sums[choice.index()] += i128::from(score);
    }

    /// `N_all`: classified responses.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    fn score_total(&self) -> i128 {
        self.sums.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChoiceStatistic {
    pub choice: Choice,
    pub count: usize,
    pub percent: f64,
    pub discrimination: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatistic {
    pub question: String,
    pub responses: usize,
    pub difficulty: f64,
    pub choices: [ChoiceStatistic; 5],
}

impl ItemStatistic {
    /// Second-pass statistics for one question; `sig` is the exam-wide
    /// score standard deviation.
    pub fn from_tally(question: &str, tally: &Tally, sig: f64) -> Result<Self, DegenerateInput> {
        let n_all = tally.total();
        if n_all < 2 {
            return Err(DegenerateInput::TooFewResponses {
                question: question.to_string(),
                found: n_all,
            });
        }
        let total = tally.score_total();
        let n = n_all as f64;

        let choices = Choice::ALL.map(|choice| {
            let n_x = tally.counts[choice.index()];
            let sum_x = tally.sums[choice.index()];

            let avg_chose = if n_x > 0 {
                sum_x as f64 / n_x as f64
            } else {
                0.0
            };
            let avg_other = if n_x < n_all {
                (total - sum_x) as f64 / (n_all - n_x) as f64
            } else {
                0.0
            };
            let delta = avg_chose - avg_other;
            let spread = (n_x * (n_all - n_x)) as f64 / (n * (n - 1.0));

            // Empty or unanimous buckets carry no contrast; keep them at +0.
            let discrimination = if spread == 0.0 {
                0.0
            } else {
                delta * spread.sqrt() / sig
            };

            ChoiceStatistic {
                choice,
                count: n_x,
                percent: 100.0 * n_x as f64 / n,
                discrimination,
            }
        });

        Ok(Self {
            question: question.to_string(),
            responses: n_all,
            difficulty: tally.counts[Choice::A.index()] as f64 / n,
            choices,
        })
    }

    /// KR-20 item variance term `d·(1−d)`.
    pub fn variance(&self) -> f64 {
        self.difficulty * (1.0 - self.difficulty)
    }

    pub fn choice(&self, choice: Choice) -> &ChoiceStatistic {
        &self.choices[choice.index()]
    }
}
