use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::dto::assistant_dto::{ChatRequest, ChatResponse, ContextResponse, GreetingResponse};
use crate::AppState;

#[axum::debug_handler]
pub async fn get_context(State(state): State<AppState>) -> crate::error::Result<Response> {
    let document = state.session_service.document()?;
    Ok(Json(ContextResponse {
        extracted_content: document.extracted_text,
        explanation: document.explanation,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn greeting(State(state): State<AppState>) -> crate::error::Result<Response> {
    state
        .assistant_service
        .refresh(&state.session_service)
        .await?;
    let text = state.assistant_service.greeting()?;
    Ok(Json(GreetingResponse { text }).into_response())
}

#[axum::debug_handler]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    state
        .assistant_service
        .refresh(&state.session_service)
        .await?;

    match state.assistant_service.ask(&payload.input).await? {
        Some(text) => Ok(Json(ChatResponse { text }).into_response()),
        None => Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "The assistant is still answering the previous message" })),
        )
            .into_response()),
    }
}
