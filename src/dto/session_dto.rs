use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::attempt::AttemptResult;
use crate::services::render_service::QuizView;
use crate::services::session_service::{Notice, SessionState};

/// Payload produced by document processing: the source text, its
/// explanation and the serialized quiz generated from it. The quiz is
/// validated when it is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPayload {
    pub extracted_text: String,
    #[serde(default)]
    pub explanation: String,
    pub quiz: String,
    pub audio_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDataResponse {
    pub has_processed_file: bool,
    pub extracted_text: String,
    pub explanation: String,
    pub quiz: String,
    pub audio_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerRequest {
    pub option_index: Option<usize>,
    #[validate(length(max = 2000))]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: uuid::Uuid,
    pub state: SessionState,
    pub busy: bool,
    pub has_document: bool,
    pub explanation: String,
    pub audio_file: Option<String>,
    pub quiz: Option<QuizView>,
    pub answered_count: usize,
    pub result: Option<AttemptResult>,
    pub history_size: usize,
    pub notice: Option<Notice>,
}
