use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::services::export_service::EXPORT_FILE_NAME;
use crate::{error::Result, AppState};

/// Download the loaded quiz with its answers and explanations.
pub async fn export_quiz(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let text = state.session_service.export_text()?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    ))
}
