use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::session_dto::{AnswerRequest, InitialPayload};
use crate::error::Error;
use crate::models::generation::RegenerationCriteria;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_session_data(State(state): State<AppState>) -> crate::error::Result<Response> {
    let data = state.session_service.session_data()?;
    Ok(Json(data).into_response())
}

#[axum::debug_handler]
pub async fn get_session(State(state): State<AppState>) -> crate::error::Result<Response> {
    Ok(Json(state.session_service.snapshot()?).into_response())
}

#[axum::debug_handler]
pub async fn load_session(
    State(state): State<AppState>,
    Json(payload): Json<InitialPayload>,
) -> crate::error::Result<Response> {
    let snapshot = state.session_service.load_initial(payload)?;
    Ok(Json(snapshot).into_response())
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(payload): Json<AnswerRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let snapshot = match (payload.option_index, payload.text.as_deref()) {
        (Some(option_index), None) => state.session_service.select_option(index, option_index)?,
        (None, Some(text)) => state.session_service.edit_answer(index, text)?,
        _ => {
            return Err(Error::BadRequest(
                "Provide either option_index or text".to_string(),
            ))
        }
    };
    Ok(Json(snapshot).into_response())
}

#[axum::debug_handler]
pub async fn submit(State(state): State<AppState>) -> crate::error::Result<Response> {
    Ok(Json(state.session_service.submit()?).into_response())
}

#[axum::debug_handler]
pub async fn regenerate(
    State(state): State<AppState>,
    Json(criteria): Json<RegenerationCriteria>,
) -> crate::error::Result<Response> {
    criteria.validate()?;
    let snapshot = state.session_service.regenerate(criteria).await?;
    Ok(Json(snapshot).into_response())
}

#[axum::debug_handler]
pub async fn dismiss_notice(State(state): State<AppState>) -> crate::error::Result<Response> {
    Ok(Json(state.session_service.dismiss_notice()?).into_response())
}
