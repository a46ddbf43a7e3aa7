use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// Liveness plus a glance at the quiz session. A poisoned session lock is
/// reported as unavailable rather than failing the probe.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = match state.session_service.snapshot() {
        Ok(snapshot) => json!({
            "status": "ok",
            "session_state": snapshot.state,
            "regenerating": snapshot.busy,
        }),
        Err(e) => {
            tracing::error!(error = %e, "Session unavailable");
            json!({ "status": "degraded" })
        }
    };
    (StatusCode::OK, Json(body))
}
