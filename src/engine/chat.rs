use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domain::{ChatRecord, ChatRole, SessionAnalysis};
use crate::engine::{prompt, EngineError, QuestionEngine, DETACHED_WRITE_TIMEOUT, LLM_RETRY};
use crate::services::llm::ChatTurn;

/// Conversation context window sent to the model, excluding the system
/// prompt and the new user message.
const CONTEXT_MESSAGES: i64 = 10;
const HISTORY_MESSAGES: i64 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryEntry {
    pub role: String,
    pub message: String,
    pub created_at: String,
}

impl QuestionEngine {
    /// Answers one chatbot message for a session. The session report is the
    /// bot's grounding; if it is not cached yet it is generated first. Unlike
    /// generation and analysis, a model failure here is surfaced: there is no
    /// meaningful canned reply to a free-form question.
    pub async fn chat_reply(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> Result<String, EngineError> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(EngineError::Validation("message must not be empty".into()));
        }

        let analysis = self.ensure_analysis(session_id).await?;

        let mut messages = vec![ChatTurn::system(prompt::chat_system_prompt(&analysis))];
        for record in self.repo.chat_messages(session_id, CONTEXT_MESSAGES).await? {
            messages.push(match record.role {
                ChatRole::User => ChatTurn::user(record.message),
                ChatRole::Assistant => ChatTurn::assistant(record.message),
            });
        }
        messages.push(ChatTurn::user(user_message.to_string()));

        let reply = LLM_RETRY
            .run("chat-reply", || {
                let messages = messages.clone();
                async move { self.llm.chat(&messages).await }
            })
            .await?;

        self.persist_turns_detached(session_id, user_message, &reply);
        Ok(reply)
    }

    /// Session conversation, oldest first.
    pub async fn chat_history(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatHistoryEntry>, EngineError> {
        let records = self.repo.chat_messages(session_id, HISTORY_MESSAGES).await?;
        Ok(records
            .into_iter()
            .map(|r| ChatHistoryEntry {
                role: r.role.as_str().to_string(),
                message: r.message,
                created_at: r.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
            .collect())
    }

    async fn ensure_analysis(&self, session_id: &str) -> Result<SessionAnalysis, EngineError> {
        if let Some(analysis) = self.repo.find_analysis(session_id).await? {
            return Ok(analysis);
        }
        self.session_report(session_id).await
    }

    /// Stores both sides of the exchange after a successful reply. The reply
    /// already went to the client, so failures here only shorten the
    /// conversation memory.
    fn persist_turns_detached(&self, session_id: &str, user_message: &str, reply: &str) {
        let repo = self.repo.clone();
        let now = Utc::now();
        let user_record = ChatRecord {
            session_id: session_id.to_string(),
            role: ChatRole::User,
            message: user_message.to_string(),
            created_at: now,
        };
        let assistant_record = ChatRecord {
            session_id: session_id.to_string(),
            role: ChatRole::Assistant,
            message: reply.to_string(),
            created_at: now,
        };

        tokio::spawn(async move {
            let write = async {
                repo.insert_chat_message(&user_record).await?;
                repo.insert_chat_message(&assistant_record).await
            };
            match tokio::time::timeout(DETACHED_WRITE_TIMEOUT, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(session_id = %user_record.session_id, error = %err, "failed to store chat turns");
                }
                Err(_) => {
                    warn!(session_id = %user_record.session_id, "storing chat turns timed out");
                }
            }
        });
    }
}
