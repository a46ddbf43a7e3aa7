use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::QuestionFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub index: usize,
    pub format: QuestionFormat,
    pub verdict: Verdict,
    pub feedback: String,
    pub given_answer: Option<String>,
    pub correct_answers: Vec<String>,
}

/// Outcome of grading one attempt. Derived from the question set and the
/// answer store; recomputed in full on every grading pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    pub results: Vec<QuestionResult>,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub unanswered_count: usize,
    pub total: usize,
    pub graded_at: DateTime<Utc>,
}

impl AttemptResult {
    pub fn from_results(results: Vec<QuestionResult>) -> Self {
        let count = |v: Verdict| results.iter().filter(|r| r.verdict == v).count();
        let correct_count = count(Verdict::Correct);
        let incorrect_count = count(Verdict::Incorrect);
        let unanswered_count = count(Verdict::Unanswered);
        let total = results.len();
        Self {
            results,
            correct_count,
            incorrect_count,
            unanswered_count,
            total,
            graded_at: Utc::now(),
        }
    }

    pub fn score_line(&self) -> String {
        format!("Your score: {} out of {}", self.correct_count, self.total)
    }

    pub fn verdict(&self, index: usize) -> Option<Verdict> {
        self.results.get(index).map(|r| r.verdict)
    }
}
