mod chatbot;
mod health;
mod questions;
mod report;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

// Operation messages shown in the response envelope.
pub(crate) const MSG_GENERATE_SUCCESS: &str = "Berhasil generate pertanyaan";
pub(crate) const MSG_GENERATE_FAILED: &str = "Gagal generate pertanyaan";
pub(crate) const MSG_SUBMIT_ANSWER_SUCCESS: &str = "Berhasil submit jawaban";
pub(crate) const MSG_SUBMIT_ANSWER_FAILED: &str = "Gagal submit jawaban";
pub(crate) const MSG_GET_SESSION_SUCCESS: &str = "Berhasil mendapatkan data session";
pub(crate) const MSG_GET_SESSION_FAILED: &str = "Gagal mendapatkan data session";
pub(crate) const MSG_GET_REPORT_SUCCESS: &str = "Berhasil generate report";
pub(crate) const MSG_GET_REPORT_FAILED: &str = "Gagal generate report";
pub(crate) const MSG_CHAT_SEND_SUCCESS: &str = "Berhasil mengirim pesan ke chatbot";
pub(crate) const MSG_CHAT_SEND_FAILED: &str = "Gagal mengirim pesan ke chatbot";
pub(crate) const MSG_CHAT_HISTORY_SUCCESS: &str = "Berhasil mendapatkan riwayat chat";
pub(crate) const MSG_CHAT_HISTORY_FAILED: &str = "Gagal mendapatkan riwayat chat";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/questions/generate", get(questions::generate))
        .route("/questions/answer", post(questions::submit_answer))
        .route(
            "/questions/sessions/:session_id",
            get(questions::session_answers),
        )
        .route("/report/sessions/:session_id", get(report::session_report))
        .route("/chatbot/sessions/:session_id", post(chatbot::send_message))
        .route(
            "/chatbot/sessions/:session_id/history",
            get(chatbot::history),
        )
        .route("/health", get(health::health))
        .with_state(state)
}
