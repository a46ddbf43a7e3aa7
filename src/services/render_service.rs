use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::answer::AnswerStore;
use crate::models::attempt::{AttemptResult, Verdict};
use crate::models::question::{Question, QuestionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeStyle {
    Success,
    Warning,
    Danger,
    Secondary,
    Info,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub style: BadgeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceControl {
    pub value: String,
    pub selected: bool,
    pub mark: Option<Mark>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Affordance {
    /// Single-choice group: at most one control is selected.
    Choice {
        group: String,
        controls: Vec<ChoiceControl>,
    },
    Text {
        field_id: String,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLevel {
    Success,
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub number: usize,
    pub text: String,
    pub badges: Vec<Badge>,
    pub input: Affordance,
    pub feedback: Option<Feedback>,
}

/// Display-independent rendering of a question set: the affordances a
/// front end draws, their current input state and any grading feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizView {
    pub questions: Vec<QuestionView>,
    pub score_line: Option<String>,
    pub submit_enabled: bool,
}

pub struct RenderService;

impl RenderService {
    pub fn render(questions: &QuestionSet) -> QuizView {
        QuizView {
            questions: questions
                .iter()
                .enumerate()
                .map(|(index, q)| Self::render_question(index, q))
                .collect(),
            score_line: None,
            submit_enabled: true,
        }
    }

    fn render_question(index: usize, q: &Question) -> QuestionView {
        let input = match q.choices() {
            Some(options) => Affordance::Choice {
                group: format!("question-{}", index),
                controls: options
                    .into_iter()
                    .map(|value| ChoiceControl {
                        value: value.to_string(),
                        selected: false,
                        mark: None,
                    })
                    .collect(),
            },
            None => Affordance::Text {
                field_id: format!("short-answer-{}", index),
                value: String::new(),
            },
        };

        QuestionView {
            index,
            number: index + 1,
            text: q.text.clone(),
            badges: Self::badges(q),
            input,
            feedback: None,
        }
    }

    fn badges(q: &Question) -> Vec<Badge> {
        let mut badges = Vec::new();
        if let Some(difficulty) = &q.difficulty {
            let style = match difficulty.to_lowercase().as_str() {
                "easy" => BadgeStyle::Success,
                "medium" => BadgeStyle::Warning,
                "hard" => BadgeStyle::Danger,
                _ => BadgeStyle::Secondary,
            };
            badges.push(Badge {
                label: difficulty.clone(),
                style,
            });
        }
        if let Some(level) = &q.taxonomy_level {
            badges.push(Badge {
                label: level.clone(),
                style: BadgeStyle::Info,
            });
        }
        badges.push(Badge {
            label: q.format().as_str().to_string(),
            style: BadgeStyle::Primary,
        });
        badges
    }
}

impl QuizView {
    fn question_mut(&mut self, index: usize) -> Result<&mut QuestionView> {
        self.questions
            .get_mut(index)
            .ok_or_else(|| Error::BadRequest(format!("There is no question at index {}", index)))
    }

    /// Selects one option of a choice question, deselecting its siblings,
    /// and records the option's text as the answer.
    pub fn select_option(
        &mut self,
        index: usize,
        option_index: usize,
        answers: &mut AnswerStore,
    ) -> Result<()> {
        let view = self.question_mut(index)?;
        let Affordance::Choice { controls, .. } = &mut view.input else {
            return Err(Error::BadRequest(format!(
                "Question {} expects a typed answer",
                index + 1
            )));
        };
        if option_index >= controls.len() {
            return Err(Error::BadRequest(format!(
                "Question {} has no option {}",
                index + 1,
                option_index
            )));
        }
        for (i, control) in controls.iter_mut().enumerate() {
            control.selected = i == option_index;
        }
        answers.record(index, controls[option_index].value.clone());
        Ok(())
    }

    /// Mirrors a keystroke in a short-answer field into the answer store.
    pub fn edit_text(&mut self, index: usize, text: &str, answers: &mut AnswerStore) -> Result<()> {
        let view = self.question_mut(index)?;
        let Affordance::Text { value, .. } = &mut view.input else {
            return Err(Error::BadRequest(format!(
                "Question {} expects one of its options to be selected",
                index + 1
            )));
        };
        *value = text.to_string();
        answers.record(index, text.trim());
        Ok(())
    }

    /// Writes grading feedback into the view and locks submission. Choice
    /// controls are marked by exact value identity.
    pub fn apply_feedback(&mut self, result: &AttemptResult) {
        for outcome in &result.results {
            let Some(view) = self.questions.get_mut(outcome.index) else {
                continue;
            };
            let level = match outcome.verdict {
                Verdict::Correct => FeedbackLevel::Success,
                Verdict::Incorrect => FeedbackLevel::Danger,
                Verdict::Unanswered => FeedbackLevel::Warning,
            };
            view.feedback = Some(Feedback {
                level,
                message: outcome.feedback.clone(),
            });

            if let Affordance::Choice { controls, .. } = &mut view.input {
                for control in controls.iter_mut() {
                    control.mark = if outcome.correct_answers.contains(&control.value) {
                        Some(Mark::Correct)
                    } else if outcome.given_answer.as_deref() == Some(control.value.as_str()) {
                        Some(Mark::Incorrect)
                    } else {
                        None
                    };
                }
            }
        }
        self.score_line = Some(result.score_line());
        self.submit_enabled = false;
    }

    pub fn selected_option(&self, index: usize) -> Option<&str> {
        match &self.questions.get(index)?.input {
            Affordance::Choice { controls, .. } => controls
                .iter()
                .find(|c| c.selected)
                .map(|c| c.value.as_str()),
            Affordance::Text { .. } => None,
        }
    }

    pub fn mark_of(&self, index: usize, value: &str) -> Option<Mark> {
        match &self.questions.get(index)?.input {
            Affordance::Choice { controls, .. } => controls
                .iter()
                .find(|c| c.value == value)
                .and_then(|c| c.mark),
            Affordance::Text { .. } => None,
        }
    }
}
