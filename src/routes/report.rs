use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::engine::EngineError;
use crate::response::{success, ApiError};
use crate::routes::{MSG_GET_REPORT_FAILED, MSG_GET_REPORT_SUCCESS};
use crate::state::AppState;

/// GET /report/sessions/:session_id
pub async fn session_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    if session_id.trim().is_empty() {
        return ApiError::failed(
            MSG_GET_REPORT_FAILED,
            EngineError::Validation("session_id is required".into()),
        )
        .into_response();
    }

    match state.engine().session_report(&session_id).await {
        Ok(report) => success(MSG_GET_REPORT_SUCCESS, report),
        Err(err) => ApiError::failed(MSG_GET_REPORT_FAILED, err).into_response(),
    }
}
