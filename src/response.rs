use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::engine::EngineError;

/// The envelope every endpoint answers with. `message` names the operation
/// in Indonesian; `error` carries either a human-readable string or a
/// field→message map for validation failures.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

pub fn success(message: &str, data: impl Serialize) -> Response {
    let data = match serde_json::to_value(data) {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "failed to serialize response data");
            return ApiError::internal().into_response();
        }
    };
    let body = Envelope {
        success: true,
        message: Some(message.to_string()),
        error: None,
        data: Some(data),
        meta: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    error: Option<Value>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            error: Some(Value::String(detail.into())),
        }
    }

    /// Validation failure carrying a field→message map.
    pub fn fields(message: impl Into<String>, fields: BTreeMap<&'static str, String>) -> Self {
        let map = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect();
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            error: Some(Value::Object(map)),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal Server Error".to_string(),
            error: None,
        }
    }

    /// Maps an engine failure under the operation's Indonesian message.
    /// Client-caused conditions become 400s; database and chat-model
    /// failures become opaque 500s with the detail logged only.
    pub fn failed(message: &str, err: EngineError) -> Self {
        match err {
            EngineError::Validation(detail) => Self::bad_request(message, detail),
            EngineError::QuestionNotFound(id) => {
                Self::bad_request(message, format!("question not found: {id}"))
            }
            EngineError::NoAnswers => {
                Self::bad_request(message, "no answers found for session")
            }
            EngineError::NoCachedQuestions => Self::bad_request(
                message,
                "no cached questions available, try use_ai=true",
            ),
            EngineError::Repo(err) => {
                error!(error = %err, "repository failure");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: message.to_string(),
                    error: Some(Value::String("Internal Server Error".to_string())),
                }
            }
            EngineError::Llm(err) => {
                error!(error = %err, "assistant failure");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: message.to_string(),
                    error: Some(Value::String("assistant unavailable".to_string())),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: false,
            message: Some(self.message),
            error: self.error,
            data: None,
            meta: None,
        };
        (self.status, Json(body)).into_response()
    }
}
