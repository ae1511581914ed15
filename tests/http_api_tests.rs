//! Route-level tests over the in-memory engine: envelope shape, validation
//! field maps, and status codes.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use disleksia_backend::db::DatabaseProxy;
use disleksia_backend::state::AppState;

use common::{engine, MemoryRepository, ScriptedLlm};

fn test_app() -> Router {
    // never connected; routes under test stay off the database
    let db = DatabaseProxy::connect_lazy("postgres://127.0.0.1:1/unused")
        .expect("lazy pool");
    let state = AppState::new(
        Arc::new(db),
        engine(MemoryRepository::new(), ScriptedLlm::unavailable()),
    );
    disleksia_backend::app(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generate_returns_the_success_envelope() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/questions/generate?count=2&includeAnswer=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Berhasil generate pertanyaan");
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    let first = &json["data"][0];
    assert!(first["answer"].is_string());
    assert_eq!(first["options"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn repeated_pattern_params_restrict_generation() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/questions/generate?pattern=b-d&pattern=p-q%2Cm-w&count=6")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let questions = json["data"].as_array().unwrap();
    assert!(!questions.is_empty());
    for q in questions {
        let pair = q["targetLetterPair"].as_str().unwrap();
        assert!(["b-d", "p-q", "m-w"].contains(&pair), "unexpected pair {pair}");
    }
}

#[tokio::test]
async fn generate_hides_answers_by_default() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/questions/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert!(json["data"][0].get("answer").is_none());
}

#[tokio::test]
async fn invalid_difficulty_is_a_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/questions/generate?difficulty=impossible")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Gagal generate pertanyaan");
    assert!(json["error"].as_str().unwrap().contains("invalid difficulty"));
}

#[tokio::test]
async fn invalid_pattern_is_a_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/questions/generate?pattern=x-y")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("invalid letter pair"));
}

#[tokio::test]
async fn missing_answer_fields_come_back_as_a_field_map() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::post("/questions/answer")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"user_id":"u-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Gagal submit jawaban");
    let fields = json["error"].as_object().unwrap();
    assert!(fields.contains_key("session_id"));
    assert!(fields.contains_key("question_id"));
    assert!(fields.contains_key("answer"));
    assert!(!fields.contains_key("user_id"));
}

#[tokio::test]
async fn unknown_question_is_a_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::post("/questions/answer")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"user_id":"u-1","session_id":"s-1","question_id":"q-nope","answer":"BATU"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("question not found"));
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::post("/chatbot/sessions/s-1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "message cannot be empty");
}

#[tokio::test]
async fn session_answer_log_is_empty_for_an_unknown_session() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/questions/sessions/s-nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn report_for_an_unanswered_session_is_a_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::get("/report/sessions/s-nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Gagal generate report");
    assert!(json["error"].as_str().unwrap().contains("no answers found"));
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = test_app();
    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
