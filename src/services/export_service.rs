use crate::models::question::{AnswerKey, QuestionSet};

pub const EXPORT_FILE_NAME: &str = "quiz_with_answers.txt";

pub struct ExportService;

impl ExportService {
    /// Plain-text answer key of a quiz: every question with its options,
    /// official answer(s) and explanation.
    pub fn quiz_text(questions: &QuestionSet) -> String {
        let mut text = String::from("AI Quiz with Answers and Explanations\n\n");

        for (idx, q) in questions.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", idx + 1, q.text));

            let options: Vec<&str> = match &q.key {
                AnswerKey::ShortAnswer { acceptable_answers } => {
                    acceptable_answers.iter().map(String::as_str).collect()
                }
                _ => q.choices().unwrap_or_default(),
            };
            for opt in options {
                text.push_str(&format!("   - {}\n", opt));
            }

            match &q.key {
                AnswerKey::Mcq { correct_answer, .. } | AnswerKey::TrueFalse { correct_answer } => {
                    text.push_str(&format!("Answer: {}\n", correct_answer));
                }
                AnswerKey::ShortAnswer { acceptable_answers } => {
                    text.push_str(&format!(
                        "Acceptable Answers: {}\n",
                        acceptable_answers.join(" or ")
                    ));
                }
            }

            text.push_str(&format!("Explanation: {}\n\n", q.explanation));
        }

        text
    }
}
