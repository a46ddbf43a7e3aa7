use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Options shown for every true/false question, in display order.
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    Mcq,
    TrueFalse,
    ShortAnswer,
}

impl QuestionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFormat::Mcq => "mcq",
            QuestionFormat::TrueFalse => "true_false",
            QuestionFormat::ShortAnswer => "short_answer",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "mcq" | "multiple_choice" => Some(QuestionFormat::Mcq),
            "true_false" | "truefalse" => Some(QuestionFormat::TrueFalse),
            "short_answer" => Some(QuestionFormat::ShortAnswer),
            _ => None,
        }
    }
}

/// The accepted answer(s) of a question. Each variant carries exactly the
/// data its format needs, so a short answer never has a single correct
/// answer and a choice question always has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    Mcq {
        options: Vec<String>,
        correct_answer: String,
    },
    TrueFalse {
        correct_answer: String,
    },
    ShortAnswer {
        acceptable_answers: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub key: AnswerKey,
    pub explanation: String,
    pub difficulty: Option<String>,
    pub taxonomy_level: Option<String>,
}

/// Serialized form of a question as produced by the generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(alias = "text")]
    pub question: Option<String>,
    #[serde(alias = "options", skip_serializing_if = "Option::is_none")]
    pub option: Option<Vec<String>>,
    #[serde(
        alias = "correct_answer",
        alias = "correctAnswer",
        skip_serializing_if = "Option::is_none"
    )]
    pub answer: Option<JsonValue>,
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(alias = "taxonomyLevel", skip_serializing_if = "Option::is_none")]
    pub taxonomy_level: Option<String>,
}

impl RawQuestion {
    fn answer_text(&self) -> Option<String> {
        match self.answer.as_ref()? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Bool(true) => Some(TRUE_FALSE_OPTIONS[0].to_string()),
            JsonValue::Bool(false) => Some(TRUE_FALSE_OPTIONS[1].to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Question {
    pub fn from_raw(raw: RawQuestion) -> Result<Self> {
        let answer = raw.answer_text();
        let text = non_blank(raw.question)
            .ok_or_else(|| Error::MalformedQuestion("question text is missing".to_string()))?;
        let explanation = non_blank(raw.explanation)
            .ok_or_else(|| Error::MalformedQuestion("explanation is missing".to_string()))?;

        let format = match raw.format.as_deref() {
            None => QuestionFormat::Mcq,
            Some(label) => QuestionFormat::from_label(label).ok_or_else(|| {
                Error::MalformedQuestion(format!("unknown question format '{}'", label))
            })?,
        };

        let key = match format {
            QuestionFormat::Mcq => {
                let options = raw.option.ok_or_else(|| {
                    Error::MalformedQuestion("multiple choice options are missing".to_string())
                })?;
                if options.len() < 2 {
                    return Err(Error::MalformedQuestion(format!(
                        "multiple choice question needs at least 2 options, got {}",
                        options.len()
                    )));
                }
                let correct_answer = answer.ok_or_else(|| {
                    Error::MalformedQuestion("correct answer is missing".to_string())
                })?;
                if !options.iter().any(|o| o == &correct_answer) {
                    return Err(Error::MalformedQuestion(format!(
                        "correct answer '{}' is not one of the options",
                        correct_answer
                    )));
                }
                AnswerKey::Mcq {
                    options,
                    correct_answer,
                }
            }
            QuestionFormat::TrueFalse => {
                let given = answer.ok_or_else(|| {
                    Error::MalformedQuestion("correct answer is missing".to_string())
                })?;
                let correct_answer = TRUE_FALSE_OPTIONS
                    .iter()
                    .find(|o| o.eq_ignore_ascii_case(given.trim()))
                    .ok_or_else(|| {
                        Error::MalformedQuestion(format!(
                            "true/false answer must be True or False, got '{}'",
                            given
                        ))
                    })?;
                AnswerKey::TrueFalse {
                    correct_answer: correct_answer.to_string(),
                }
            }
            QuestionFormat::ShortAnswer => {
                let acceptable_answers: Vec<String> = raw
                    .option
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect();
                if acceptable_answers.is_empty() {
                    return Err(Error::MalformedQuestion(
                        "short answer question has no acceptable answers".to_string(),
                    ));
                }
                AnswerKey::ShortAnswer { acceptable_answers }
            }
        };

        Ok(Self {
            text,
            key,
            explanation,
            difficulty: non_blank(raw.difficulty),
            taxonomy_level: non_blank(raw.taxonomy_level),
        })
    }

    pub fn to_raw(&self) -> RawQuestion {
        let (option, answer) = match &self.key {
            AnswerKey::Mcq {
                options,
                correct_answer,
            } => (
                Some(options.clone()),
                Some(JsonValue::String(correct_answer.clone())),
            ),
            AnswerKey::TrueFalse { correct_answer } => {
                (None, Some(JsonValue::String(correct_answer.clone())))
            }
            AnswerKey::ShortAnswer { acceptable_answers } => {
                (Some(acceptable_answers.clone()), None)
            }
        };
        RawQuestion {
            question: Some(self.text.clone()),
            option,
            answer,
            explanation: Some(self.explanation.clone()),
            format: Some(self.format().as_str().to_string()),
            difficulty: self.difficulty.clone(),
            taxonomy_level: self.taxonomy_level.clone(),
        }
    }

    pub fn format(&self) -> QuestionFormat {
        match self.key {
            AnswerKey::Mcq { .. } => QuestionFormat::Mcq,
            AnswerKey::TrueFalse { .. } => QuestionFormat::TrueFalse,
            AnswerKey::ShortAnswer { .. } => QuestionFormat::ShortAnswer,
        }
    }

    /// Selectable options for choice questions, `None` for short answers.
    pub fn choices(&self) -> Option<Vec<&str>> {
        match &self.key {
            AnswerKey::Mcq { options, .. } => Some(options.iter().map(String::as_str).collect()),
            AnswerKey::TrueFalse { .. } => Some(TRUE_FALSE_OPTIONS.to_vec()),
            AnswerKey::ShortAnswer { .. } => None,
        }
    }

    pub fn correct_answer(&self) -> Option<&str> {
        match &self.key {
            AnswerKey::Mcq { correct_answer, .. } | AnswerKey::TrueFalse { correct_answer } => {
                Some(correct_answer.as_str())
            }
            AnswerKey::ShortAnswer { .. } => None,
        }
    }

    /// Every answer that grades as correct.
    pub fn accepted_answers(&self) -> Vec<&str> {
        match &self.key {
            AnswerKey::Mcq { correct_answer, .. } | AnswerKey::TrueFalse { correct_answer } => {
                vec![correct_answer.as_str()]
            }
            AnswerKey::ShortAnswer { acceptable_answers } => {
                acceptable_answers.iter().map(String::as_str).collect()
            }
        }
    }
}

/// An ordered, non-empty list of questions. The order is the display order
/// and the index space of the answer store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::MalformedQuestionSet(
                "question set contains no questions".to_string(),
            ));
        }
        Ok(Self { questions })
    }

    /// Parses and validates a serialized question set. Accepts a JSON array
    /// or an object with a `questions` array, optionally inside a Markdown
    /// code fence.
    pub fn parse(serialized: &str) -> Result<Self> {
        let body = strip_code_fence(serialized);
        let value: JsonValue = serde_json::from_str(body)
            .map_err(|e| Error::MalformedQuestionSet(format!("quiz is not valid JSON: {}", e)))?;

        let items = value
            .as_array()
            .or_else(|| value.get("questions").and_then(|q| q.as_array()))
            .ok_or_else(|| {
                Error::MalformedQuestionSet("expected a JSON array of questions".to_string())
            })?;

        let mut questions = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let raw: RawQuestion = serde_json::from_value(item.clone()).map_err(|e| {
                Error::MalformedQuestionSet(format!("question {}: {}", idx + 1, e))
            })?;
            let question = Question::from_raw(raw).map_err(|e| match e {
                Error::MalformedQuestion(reason) => {
                    Error::MalformedQuestionSet(format!("question {}: {}", idx + 1, reason))
                }
                other => other,
            })?;
            questions.push(question);
        }

        Self::new(questions)
    }

    pub fn to_serialized(&self) -> Result<String> {
        let raw: Vec<RawQuestion> = self.questions.iter().map(Question::to_raw).collect();
        Ok(serde_json::to_string(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    pub fn texts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.text.clone()).collect()
    }

    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag, e.g. ```json
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_one(value: JsonValue) -> Result<Question> {
        let raw: RawQuestion = serde_json::from_value(value).unwrap();
        Question::from_raw(raw)
    }

    #[test]
    fn parses_generator_output_with_default_format() {
        let set = QuestionSet::parse(
            r#"[{"question": "Capital of France?", "option": ["Paris", "Rome"], "answer": "Paris", "explanation": "Revise European capitals."}]"#,
        )
        .unwrap();

        assert_eq!(set.len(), 1);
        let q = set.get(0).unwrap();
        assert_eq!(q.format(), QuestionFormat::Mcq);
        assert_eq!(q.correct_answer(), Some("Paris"));
        assert_eq!(q.choices(), Some(vec!["Paris", "Rome"]));
    }

    #[test]
    fn accepts_fenced_object_payload() {
        let payload = "```json\n{\"questions\": [{\"text\": \"Water boils at 100C at sea level\", \"format\": \"true_false\", \"correctAnswer\": \"true\", \"explanation\": \"Physics.\"}]}\n```";
        let set = QuestionSet::parse(payload).unwrap();
        let q = set.get(0).unwrap();
        assert_eq!(q.format(), QuestionFormat::TrueFalse);
        assert_eq!(q.correct_answer(), Some("True"));
        assert_eq!(q.choices(), Some(vec!["True", "False"]));
    }

    #[test]
    fn boolean_true_false_answer_is_canonicalised() {
        let q = parse_one(json!({
            "question": "The sky is green",
            "format": "true_false",
            "answer": false,
            "explanation": "It is blue."
        }))
        .unwrap();
        assert_eq!(q.correct_answer(), Some("False"));
    }

    #[test]
    fn mcq_without_options_is_rejected() {
        let err = QuestionSet::parse(
            r#"[{"question": "Q?", "format": "mcq", "answer": "A", "explanation": "E"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedQuestionSet(ref m) if m.starts_with("question 1")));
    }

    #[test]
    fn mcq_answer_must_be_an_option() {
        let err = parse_one(json!({
            "question": "Q?",
            "option": ["A", "B"],
            "answer": "a",
            "explanation": "E"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedQuestion(_)));
    }

    #[test]
    fn mcq_needs_two_options() {
        let err = parse_one(json!({
            "question": "Q?",
            "option": ["A"],
            "answer": "A",
            "explanation": "E"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedQuestion(_)));
    }

    #[test]
    fn short_answer_needs_acceptable_answers() {
        let err = parse_one(json!({
            "question": "Q?",
            "format": "short_answer",
            "option": ["  "],
            "explanation": "E"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedQuestion(_)));

        let q = parse_one(json!({
            "question": "How many days in a week?",
            "format": "short_answer",
            "option": ["7", "seven"],
            "explanation": "Calendar basics."
        }))
        .unwrap();
        assert_eq!(q.correct_answer(), None);
        assert_eq!(q.accepted_answers(), vec!["7", "seven"]);
        assert_eq!(q.choices(), None);
    }

    #[test]
    fn text_and_explanation_are_required() {
        assert!(parse_one(json!({"option": ["A", "B"], "answer": "A", "explanation": "E"})).is_err());
        assert!(parse_one(json!({"question": "Q", "option": ["A", "B"], "answer": "A", "explanation": " "})).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = parse_one(json!({
            "question": "Q?",
            "format": "essay",
            "explanation": "E"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedQuestion(ref m) if m.contains("essay")));
    }

    #[test]
    fn empty_or_non_array_payloads_are_rejected() {
        assert!(matches!(QuestionSet::parse("[]"), Err(Error::MalformedQuestionSet(_))));
        assert!(matches!(QuestionSet::parse("{\"quiz\": 1}"), Err(Error::MalformedQuestionSet(_))));
        assert!(matches!(QuestionSet::parse("not json"), Err(Error::MalformedQuestionSet(_))));
    }

    #[test]
    fn serialized_form_parses_back_to_the_same_set() {
        let set = QuestionSet::parse(
            r#"[
                {"question": "Q1", "option": ["A", "B"], "answer": "B", "explanation": "E1", "difficulty": "easy"},
                {"question": "Q2", "format": "short_answer", "option": ["x"], "explanation": "E2", "taxonomy_level": "recall"}
            ]"#,
        )
        .unwrap();
        let again = QuestionSet::parse(&set.to_serialized().unwrap()).unwrap();
        assert_eq!(set, again);
    }
}
