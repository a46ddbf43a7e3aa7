use crate::models::answer::AnswerStore;
use crate::models::attempt::{AttemptResult, QuestionResult, Verdict};
use crate::models::question::{AnswerKey, Question, QuestionSet};

pub struct GradingService;

impl GradingService {
    /// Grades every question of the set against the learner's answers.
    /// Missing or blank answers are graded `Unanswered`; grading never fails.
    pub fn grade(questions: &QuestionSet, answers: &AnswerStore) -> AttemptResult {
        let results = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| Self::grade_question(idx, q, Self::given_answer(q, answers, idx)))
            .collect();
        let result = AttemptResult::from_results(results);

        tracing::info!(
            correct = result.correct_count,
            incorrect = result.incorrect_count,
            unanswered = result.unanswered_count,
            total = result.total,
            "Attempt graded"
        );
        result
    }

    /// Choice answers are option literals and are compared untouched; only
    /// typed short answers are trimmed.
    fn given_answer<'a>(q: &Question, answers: &'a AnswerStore, index: usize) -> Option<&'a str> {
        match q.key {
            AnswerKey::ShortAnswer { .. } => answers.answer_for(index),
            AnswerKey::Mcq { .. } | AnswerKey::TrueFalse { .. } => answers
                .get(index)
                .filter(|answer| !answer.trim().is_empty()),
        }
    }

    fn grade_question(index: usize, q: &Question, given: Option<&str>) -> QuestionResult {
        let verdict = match (&q.key, given) {
            (_, None) => Verdict::Unanswered,
            (
                AnswerKey::Mcq { correct_answer, .. } | AnswerKey::TrueFalse { correct_answer },
                Some(answer),
            ) => {
                if answer == correct_answer.as_str() {
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                }
            }
            (AnswerKey::ShortAnswer { acceptable_answers }, Some(answer)) => {
                let answer = answer.to_lowercase();
                if acceptable_answers
                    .iter()
                    .any(|accepted| accepted.to_lowercase() == answer)
                {
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                }
            }
        };

        QuestionResult {
            index,
            format: q.format(),
            verdict,
            feedback: Self::feedback(q, verdict),
            given_answer: given.map(str::to_string),
            correct_answers: q.accepted_answers().into_iter().map(str::to_string).collect(),
        }
    }

    fn feedback(q: &Question, verdict: Verdict) -> String {
        let answer_phrase = match &q.key {
            AnswerKey::Mcq { correct_answer, .. } | AnswerKey::TrueFalse { correct_answer } => {
                format!("The correct answer is \"{}\".", correct_answer)
            }
            AnswerKey::ShortAnswer { acceptable_answers } => {
                format!(
                    "Acceptable answers: \"{}\".",
                    acceptable_answers.join("\" or \"")
                )
            }
        };

        match verdict {
            Verdict::Correct => format!("Correct! {}", q.explanation),
            Verdict::Incorrect => format!("Incorrect. {} {}", answer_phrase, q.explanation),
            Verdict::Unanswered => format!("You didn't answer this question. {}", answer_phrase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> QuestionSet {
        QuestionSet::parse(
            r#"[
                {"question": "Capital of France?", "format": "mcq", "option": ["Paris", "Rome", "Berlin"], "answer": "Paris", "explanation": "Paris is the capital."},
                {"question": "Days in a week?", "format": "short_answer", "option": ["7", "seven"], "explanation": "Seven days."},
                {"question": "Rust has a garbage collector", "format": "true_false", "answer": "False", "explanation": "It uses ownership."}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn mixed_attempt_is_scored_per_format() {
        let mut answers = AnswerStore::new();
        answers.record(0, "Rome");
        answers.record(1, "Seven");

        let result = GradingService::grade(&quiz(), &answers);

        assert_eq!(result.verdict(0), Some(Verdict::Incorrect));
        assert_eq!(result.verdict(1), Some(Verdict::Correct));
        assert_eq!(result.verdict(2), Some(Verdict::Unanswered));
        assert_eq!(result.correct_count, 1);
        assert_eq!(
            result.correct_count + result.incorrect_count + result.unanswered_count,
            result.total
        );
        assert_eq!(result.score_line(), "Your score: 1 out of 3");
    }

    #[test]
    fn choice_answers_are_case_sensitive() {
        let set = QuestionSet::parse(
            r#"[{"question": "Pick A", "option": ["A", "B"], "answer": "A", "explanation": "A it is."}]"#,
        )
        .unwrap();
        let mut answers = AnswerStore::new();
        answers.record(0, "a");
        let result = GradingService::grade(&set, &answers);
        assert_eq!(result.verdict(0), Some(Verdict::Incorrect));
    }

    #[test]
    fn padded_option_is_graded_by_its_literal_text() {
        let set = QuestionSet::parse(
            r#"[{"question": "Q?", "option": ["Paris ", "Rome"], "answer": "Paris ", "explanation": "E"}]"#,
        )
        .unwrap();
        let mut answers = AnswerStore::new();
        answers.record(0, "Paris ");
        let result = GradingService::grade(&set, &answers);
        assert_eq!(result.verdict(0), Some(Verdict::Correct));
        assert_eq!(result.results[0].given_answer.as_deref(), Some("Paris "));

        answers.record(0, "Paris");
        let result = GradingService::grade(&set, &answers);
        assert_eq!(result.verdict(0), Some(Verdict::Incorrect));
    }

    #[test]
    fn short_answers_ignore_case_and_surrounding_space() {
        let set = QuestionSet::parse(
            r#"[{"question": "Capital of France?", "format": "short_answer", "option": ["paris"], "explanation": "Geography."}]"#,
        )
        .unwrap();
        let mut answers = AnswerStore::new();
        answers.record(0, "  Paris ");
        let result = GradingService::grade(&set, &answers);
        assert_eq!(result.verdict(0), Some(Verdict::Correct));
        assert_eq!(result.results[0].feedback, "Correct! Geography.");
    }

    #[test]
    fn absent_and_blank_answers_are_unanswered() {
        let mut answers = AnswerStore::new();
        answers.record(1, "   ");
        answers.record(2, "");
        let result = GradingService::grade(&quiz(), &answers);
        assert_eq!(result.unanswered_count, 3);
        assert_eq!(result.correct_count, 0);
    }

    #[test]
    fn feedback_names_the_official_answers() {
        let mut answers = AnswerStore::new();
        answers.record(0, "Berlin");
        answers.record(1, "six");
        let result = GradingService::grade(&quiz(), &answers);

        assert_eq!(
            result.results[0].feedback,
            "Incorrect. The correct answer is \"Paris\". Paris is the capital."
        );
        assert_eq!(
            result.results[1].feedback,
            "Incorrect. Acceptable answers: \"7\" or \"seven\". Seven days."
        );
        assert_eq!(
            result.results[2].feedback,
            "You didn't answer this question. The correct answer is \"False\"."
        );
        assert_eq!(result.results[1].correct_answers, vec!["7", "seven"]);
        assert_eq!(result.results[0].given_answer.as_deref(), Some("Berlin"));
    }

    #[test]
    fn grading_does_not_touch_the_answer_store() {
        let mut answers = AnswerStore::new();
        answers.record(0, " Paris ");
        let before = answers.clone();
        let _ = GradingService::grade(&quiz(), &answers);
        assert_eq!(answers, before);
    }
}
