use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::response::{success, ApiError};
use crate::routes::{
    MSG_CHAT_HISTORY_FAILED, MSG_CHAT_HISTORY_SUCCESS, MSG_CHAT_SEND_FAILED,
    MSG_CHAT_SEND_SUCCESS,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    session_id: String,
}

/// POST /chatbot/sessions/:session_id
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if session_id.trim().is_empty() {
        return ApiError::failed(
            MSG_CHAT_SEND_FAILED,
            EngineError::Validation("session_id is required".into()),
        )
        .into_response();
    }
    if req.message.trim().is_empty() {
        return ApiError::bad_request(MSG_CHAT_SEND_FAILED, "message cannot be empty")
            .into_response();
    }

    match state.engine().chat_reply(&session_id, &req.message).await {
        Ok(reply) => success(
            MSG_CHAT_SEND_SUCCESS,
            ChatResponse {
                response: reply,
                session_id,
            },
        ),
        Err(err) => ApiError::failed(MSG_CHAT_SEND_FAILED, err).into_response(),
    }
}

/// GET /chatbot/sessions/:session_id/history
pub async fn history(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    if session_id.trim().is_empty() {
        return ApiError::failed(
            MSG_CHAT_HISTORY_FAILED,
            EngineError::Validation("session_id is required".into()),
        )
        .into_response();
    }

    match state.engine().chat_history(&session_id).await {
        Ok(entries) => success(MSG_CHAT_HISTORY_SUCCESS, entries),
        Err(err) => ApiError::failed(MSG_CHAT_HISTORY_FAILED, err).into_response(),
    }
}
