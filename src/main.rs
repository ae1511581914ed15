use std::sync::Arc;

use disleksia_backend::config::Config;
use disleksia_backend::db::{self, DatabaseProxy};
use disleksia_backend::engine::QuestionEngine;
use disleksia_backend::logging;
use disleksia_backend::services::llm::{OpenAiChatClient, TextGeneration};
use disleksia_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config);

    let Some(database_url) = config.database_url.as_deref() else {
        tracing::error!("DATABASE_URL is not set");
        std::process::exit(1);
    };
    let db = match DatabaseProxy::connect(database_url).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = db::migrate::run_migrations(db.pool()).await {
        tracing::error!(error = %err, "migration failed");
        std::process::exit(1);
    }
    db::seed::seed_question_bank(db.pool()).await;

    let llm = OpenAiChatClient::new(config.llm.clone());
    if !llm.is_available() {
        tracing::warn!("LLM_API_KEY not set, question generation falls back to the word bank");
    }

    let repo = Arc::new(db::repository::PgQuestionRepository::new(db.clone()));
    let engine = QuestionEngine::new(repo, Arc::new(llm));
    let state = AppState::new(Arc::new(db), engine);

    let app = disleksia_backend::app(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "disleksia-backend listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
