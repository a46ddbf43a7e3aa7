use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use uuid::Uuid;

use crate::dto::session_dto::{InitialPayload, SessionDataResponse, SessionSnapshot};
use crate::error::{Error, Result};
use crate::models::answer::AnswerStore;
use crate::models::attempt::AttemptResult;
use crate::models::document::DocumentContext;
use crate::models::generation::{GenerationRequest, RegenerationCriteria};
use crate::models::question::QuestionSet;
use crate::services::ai_service::QuestionGenerator;
use crate::services::export_service::ExportService;
use crate::services::grading_service::GradingService;
use crate::services::render_service::{QuizView, RenderService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No question set loaded.
    Idle,
    /// A question set is rendered and accepts answers.
    Presenting,
    /// The attempt was graded; submission is locked until a new set arrives.
    Graded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Handed out when a regeneration starts; only the matching ticket may
/// complete it.
#[derive(Debug, Clone)]
pub struct RegenerationTicket {
    pub id: u64,
    pub request: GenerationRequest,
}

/// The quiz state machine. Every method runs to completion; the only
/// asynchronous step (question generation) happens between
/// `begin_regeneration` and `complete_regeneration`.
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    state: SessionState,
    document: DocumentContext,
    questions: Option<QuestionSet>,
    answers: AnswerStore,
    view: Option<QuizView>,
    result: Option<AttemptResult>,
    history: Vec<String>,
    notice: Option<Notice>,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            document: DocumentContext::default(),
            questions: None,
            answers: AnswerStore::new(),
            view: None,
            result: None,
            history: Vec::new(),
            notice: None,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        self.questions.as_ref()
    }

    pub fn view(&self) -> Option<&QuizView> {
        self.view.as_ref()
    }

    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn document(&self) -> &DocumentContext {
        &self.document
    }

    /// Installs the quiz that came with a processed document. A new
    /// document starts a new history.
    pub fn load_initial(&mut self, payload: InitialPayload) -> Result<()> {
        if self.is_busy() {
            return Err(Error::Busy);
        }

        let questions = match QuestionSet::parse(&payload.quiz) {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!(error = %e, state = ?self.state, "Initial quiz rejected");
                self.notice = Some(Notice {
                    level: NoticeLevel::Warning,
                    message: "Unable to generate quiz for this document.".to_string(),
                });
                return Err(e);
            }
        };

        self.document = DocumentContext {
            extracted_text: payload.extracted_text,
            explanation: payload.explanation,
            audio_file: payload.audio_file,
        };
        self.history = questions.texts();
        self.install(questions);
        tracing::info!(session = %self.id, questions = self.history.len(), "Quiz loaded");
        Ok(())
    }

    fn install(&mut self, questions: QuestionSet) {
        self.view = Some(RenderService::render(&questions));
        self.answers.clear();
        self.result = None;
        self.notice = None;
        self.questions = Some(questions);
        self.state = SessionState::Presenting;
    }

    fn ensure_presenting(&self) -> Result<()> {
        match self.state {
            SessionState::Presenting => Ok(()),
            SessionState::Graded => Err(Error::InvalidTransition(
                "This attempt has already been graded".to_string(),
            )),
            SessionState::Idle => Err(Error::InvalidTransition("No quiz is loaded".to_string())),
        }
    }

    pub fn select_option(&mut self, index: usize, option_index: usize) -> Result<()> {
        self.ensure_presenting()?;
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| Error::Internal("presenting without a rendered quiz".to_string()))?;
        view.select_option(index, option_index, &mut self.answers)
    }

    pub fn edit_answer(&mut self, index: usize, text: &str) -> Result<()> {
        self.ensure_presenting()?;
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| Error::Internal("presenting without a rendered quiz".to_string()))?;
        view.edit_text(index, text, &mut self.answers)
    }

    /// Grades the attempt and moves to `Graded`. Rejected without effect in
    /// any other state than `Presenting`.
    pub fn submit(&mut self) -> Result<&AttemptResult> {
        match self.state {
            SessionState::Presenting => {}
            SessionState::Graded => {
                tracing::warn!(session = %self.id, "Second submission ignored");
                return Err(Error::InvalidTransition(
                    "This attempt has already been graded".to_string(),
                ));
            }
            SessionState::Idle => {
                return Err(Error::InvalidTransition("No quiz is loaded".to_string()));
            }
        }

        let (Some(questions), Some(view)) = (self.questions.as_ref(), self.view.as_mut()) else {
            return Err(Error::Internal(
                "presenting without a rendered quiz".to_string(),
            ));
        };
        let result = GradingService::grade(questions, &self.answers);
        view.apply_feedback(&result);
        self.state = SessionState::Graded;
        Ok(self.result.insert(result))
    }

    /// Starts a regeneration. At most one can be in flight.
    pub fn begin_regeneration(
        &mut self,
        criteria: RegenerationCriteria,
    ) -> Result<RegenerationTicket> {
        if self.is_busy() {
            tracing::warn!(session = %self.id, "Regeneration already in progress");
            return Err(Error::Busy);
        }
        if self.state == SessionState::Idle {
            return Err(Error::InvalidTransition("No quiz is loaded".to_string()));
        }
        if !self.document.has_content() {
            return Err(Error::InvalidTransition(
                "There is no source material to generate questions from".to_string(),
            ));
        }

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);

        Ok(RegenerationTicket {
            id,
            request: GenerationRequest::new(
                self.document.extracted_text.clone(),
                self.history.clone(),
                criteria,
            ),
        })
    }

    /// Applies the generator's answer. Any failure leaves the previous
    /// quiz, answers and grading untouched.
    pub fn complete_regeneration(&mut self, ticket: u64, outcome: Result<String>) -> Result<()> {
        if self.in_flight != Some(ticket) {
            return Err(Error::InvalidTransition(
                "Regeneration was superseded".to_string(),
            ));
        }
        self.in_flight = None;

        let questions = outcome
            .and_then(|serialized| QuestionSet::parse(&serialized))
            .and_then(|questions| self.without_repeats(questions));

        match questions {
            Ok(questions) => {
                self.history.extend(questions.texts());
                self.install(questions);
                tracing::info!(
                    session = %self.id,
                    history = self.history.len(),
                    "New questions installed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "Regeneration failed");
                self.notice = Some(Notice {
                    level: NoticeLevel::Danger,
                    message: format!("Failed to generate new questions. {}", e),
                });
                Err(e)
            }
        }
    }

    /// Releases the busy flag of a regeneration whose result will never arrive.
    pub fn abort_regeneration(&mut self, ticket: u64) {
        if self.in_flight == Some(ticket) {
            tracing::warn!(session = %self.id, ticket, "Regeneration abandoned");
            self.in_flight = None;
        }
    }

    fn without_repeats(&self, questions: QuestionSet) -> Result<QuestionSet> {
        let mut seen: HashSet<String> = self.history.iter().map(|t| normalize(t)).collect();
        let offered = questions.len();
        let fresh: Vec<_> = questions
            .into_questions()
            .into_iter()
            .filter(|q| seen.insert(normalize(&q.text)))
            .collect();

        if fresh.len() < offered {
            tracing::info!(
                dropped = offered - fresh.len(),
                "Dropped questions already asked"
            );
        }
        if fresh.is_empty() {
            return Err(Error::Generation(
                "The generator only returned questions that were already asked".to_string(),
            ));
        }
        QuestionSet::new(fresh)
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            busy: self.is_busy(),
            has_document: self.document.has_content(),
            explanation: self.document.explanation.clone(),
            audio_file: self.document.audio_file.clone(),
            quiz: self.view.clone(),
            answered_count: self.answers.answered_count(),
            result: self.result.clone(),
            history_size: self.history.len(),
            notice: self.notice.clone(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Shared handle on the process-wide quiz session plus its generator.
#[derive(Clone)]
pub struct SessionService {
    session: Arc<Mutex<QuizSession>>,
    generator: Arc<dyn QuestionGenerator>,
}

/// Clears the busy flag if a regeneration future is dropped before its
/// result is applied.
struct RegenerationGuard<'a> {
    session: &'a Mutex<QuizSession>,
    ticket: u64,
    settled: bool,
}

impl Drop for RegenerationGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Ok(mut session) = self.session.lock() {
            session.abort_regeneration(self.ticket);
        }
    }
}

impl SessionService {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            session: Arc::new(Mutex::new(QuizSession::new())),
            generator,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QuizSession>> {
        self.session
            .lock()
            .map_err(|_| Error::Internal("session lock poisoned".to_string()))
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    pub fn load_initial(&self, payload: InitialPayload) -> Result<SessionSnapshot> {
        let mut session = self.lock()?;
        session.load_initial(payload)?;
        Ok(session.snapshot())
    }

    pub fn select_option(&self, index: usize, option_index: usize) -> Result<SessionSnapshot> {
        let mut session = self.lock()?;
        session.select_option(index, option_index)?;
        Ok(session.snapshot())
    }

    pub fn edit_answer(&self, index: usize, text: &str) -> Result<SessionSnapshot> {
        let mut session = self.lock()?;
        session.edit_answer(index, text)?;
        Ok(session.snapshot())
    }

    pub fn submit(&self) -> Result<SessionSnapshot> {
        let mut session = self.lock()?;
        session.submit()?;
        Ok(session.snapshot())
    }

    pub fn dismiss_notice(&self) -> Result<SessionSnapshot> {
        let mut session = self.lock()?;
        session.dismiss_notice();
        Ok(session.snapshot())
    }

    pub async fn regenerate(&self, criteria: RegenerationCriteria) -> Result<SessionSnapshot> {
        let ticket = {
            let mut session = self.lock()?;
            session.begin_regeneration(criteria)?
        };
        let mut guard = RegenerationGuard {
            session: &self.session,
            ticket: ticket.id,
            settled: false,
        };

        let outcome = self.generator.generate(&ticket.request).await;

        let mut session = self.lock()?;
        guard.settled = true;
        session.complete_regeneration(ticket.id, outcome)?;
        Ok(session.snapshot())
    }

    pub fn document(&self) -> Result<DocumentContext> {
        Ok(self.lock()?.document().clone())
    }

    pub fn export_text(&self) -> Result<String> {
        let session = self.lock()?;
        let questions = session
            .questions()
            .ok_or_else(|| Error::NotFound("No quiz available to download".to_string()))?;
        Ok(ExportService::quiz_text(questions))
    }

    pub fn session_data(&self) -> Result<SessionDataResponse> {
        let session = self.lock()?;
        let quiz = match session.questions() {
            Some(questions) => questions.to_serialized()?,
            None => String::new(),
        };
        let document = session.document();
        Ok(SessionDataResponse {
            has_processed_file: session.questions().is_some(),
            extracted_text: document.extracted_text.clone(),
            explanation: document.explanation.clone(),
            quiz,
            audio_file: document.audio_file.clone(),
        })
    }
}
