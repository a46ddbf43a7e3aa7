use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::generation_dto::{GenerateQuizError, GenerateQuizResponse};
use crate::models::generation::GenerationRequest;
use crate::models::question::QuestionSet;
use crate::{error::Result, AppState};

async fn generate(state: &AppState, request: &GenerationRequest) -> Result<String> {
    request.validate()?;
    let serialized = state.generator.generate(request).await?;
    QuestionSet::parse(&serialized)?.to_serialized()
}

/// Generates a question set for arbitrary source material. Every failure
/// is reported as `{"error": ...}` with status 500.
#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Response {
    match generate(&state, &request).await {
        Ok(quiz) => Json(GenerateQuizResponse { quiz }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Quiz generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateQuizError {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
