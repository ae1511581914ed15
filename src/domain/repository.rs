use async_trait::async_trait;
use thiserror::Error;

use crate::domain::types::{
    AnswerRecord, ChatRecord, Difficulty, LetterPair, SessionAnalysis, StoredQuestion,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Data(String),
}

/// Persistence boundary for the question engine. The production
/// implementation is Postgres-backed; tests use an in-memory one.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    // generated question cache
    async fn insert_generated(&self, question: &StoredQuestion) -> Result<(), RepoError>;
    async fn find_generated(&self, question_id: &str) -> Result<Option<StoredQuestion>, RepoError>;
    async fn random_generated(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        limit: i64,
        exclude_ids: &[String],
    ) -> Result<Vec<StoredQuestion>, RepoError>;
    async fn increment_usage(&self, question_id: &str) -> Result<(), RepoError>;

    // user answers
    async fn insert_answer(&self, answer: &AnswerRecord) -> Result<(), RepoError>;
    async fn find_answer(
        &self,
        user_id: &str,
        session_id: &str,
        question_id: &str,
    ) -> Result<Option<AnswerRecord>, RepoError>;
    async fn answers_by_session(&self, session_id: &str) -> Result<Vec<AnswerRecord>, RepoError>;

    // session analysis cache
    async fn upsert_analysis(&self, analysis: &SessionAnalysis) -> Result<(), RepoError>;
    async fn find_analysis(&self, session_id: &str) -> Result<Option<SessionAnalysis>, RepoError>;
    /// Analyses of the user's most recent prior sessions, newest first.
    /// Feeds trend commentary in the report prompt.
    async fn recent_analyses_by_user(
        &self,
        user_id: &str,
        exclude_session_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionAnalysis>, RepoError>;

    // chat messages
    async fn insert_chat_message(&self, message: &ChatRecord) -> Result<(), RepoError>;
    /// Oldest-first, capped at `limit` when positive.
    async fn chat_messages(&self, session_id: &str, limit: i64) -> Result<Vec<ChatRecord>, RepoError>;
    async fn has_assistant_message(&self, session_id: &str) -> Result<bool, RepoError>;
}
