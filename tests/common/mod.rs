#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use disleksia_backend::domain::{
    AnswerRecord, ChatRecord, Difficulty, GenerationSource, LetterPair, QuestionRepository,
    RepoError, SessionAnalysis, StoredQuestion,
};
use disleksia_backend::engine::QuestionEngine;
use disleksia_backend::services::llm::{ChatTurn, LlmError, TextGeneration};

/// In-memory repository mirroring the Postgres implementation's observable
/// behavior, for engine tests without a database.
#[derive(Default)]
pub struct MemoryRepository {
    pub questions: Mutex<HashMap<String, StoredQuestion>>,
    pub answers: Mutex<Vec<AnswerRecord>>,
    pub analyses: Mutex<HashMap<String, SessionAnalysis>>,
    pub chats: Mutex<Vec<ChatRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn question_count(&self) -> usize {
        self.questions.lock().len()
    }

    pub fn chat_count(&self, session_id: &str) -> usize {
        self.chats
            .lock()
            .iter()
            .filter(|c| c.session_id == session_id)
            .count()
    }

    fn last_answered_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.answers
            .lock()
            .iter()
            .filter(|a| a.session_id == session_id)
            .map(|a| a.answered_at)
            .max()
    }
}

#[async_trait]
impl QuestionRepository for MemoryRepository {
    async fn insert_generated(&self, question: &StoredQuestion) -> Result<(), RepoError> {
        self.questions
            .lock()
            .insert(question.question_id.clone(), question.clone());
        Ok(())
    }

    async fn find_generated(&self, question_id: &str) -> Result<Option<StoredQuestion>, RepoError> {
        Ok(self.questions.lock().get(question_id).cloned())
    }

    async fn random_generated(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        limit: i64,
        exclude_ids: &[String],
    ) -> Result<Vec<StoredQuestion>, RepoError> {
        let mut rows: Vec<StoredQuestion> = self
            .questions
            .lock()
            .values()
            .filter(|q| q.difficulty == difficulty)
            .filter(|q| pairs.is_empty() || pairs.contains(&q.target_letter_pair))
            .filter(|q| !exclude_ids.contains(&q.question_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn increment_usage(&self, question_id: &str) -> Result<(), RepoError> {
        if let Some(q) = self.questions.lock().get_mut(question_id) {
            q.usage_count += 1;
        }
        Ok(())
    }

    async fn insert_answer(&self, answer: &AnswerRecord) -> Result<(), RepoError> {
        self.answers.lock().push(answer.clone());
        Ok(())
    }

    async fn find_answer(
        &self,
        user_id: &str,
        session_id: &str,
        question_id: &str,
    ) -> Result<Option<AnswerRecord>, RepoError> {
        Ok(self
            .answers
            .lock()
            .iter()
            .find(|a| {
                a.user_id == user_id && a.session_id == session_id && a.question_id == question_id
            })
            .cloned())
    }

    async fn answers_by_session(&self, session_id: &str) -> Result<Vec<AnswerRecord>, RepoError> {
        Ok(self
            .answers
            .lock()
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn upsert_analysis(&self, analysis: &SessionAnalysis) -> Result<(), RepoError> {
        self.analyses
            .lock()
            .insert(analysis.session_id.clone(), analysis.clone());
        Ok(())
    }

    async fn find_analysis(&self, session_id: &str) -> Result<Option<SessionAnalysis>, RepoError> {
        Ok(self.analyses.lock().get(session_id).cloned())
    }

    async fn recent_analyses_by_user(
        &self,
        user_id: &str,
        exclude_session_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionAnalysis>, RepoError> {
        let mut sessions: Vec<(String, DateTime<Utc>)> = {
            let answers = self.answers.lock();
            let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
            for answer in answers.iter() {
                if answer.user_id != user_id || answer.session_id == exclude_session_id {
                    continue;
                }
                let entry = latest
                    .entry(answer.session_id.clone())
                    .or_insert(answer.answered_at);
                if answer.answered_at > *entry {
                    *entry = answer.answered_at;
                }
            }
            latest.into_iter().collect()
        };
        sessions.sort_by(|a, b| b.1.cmp(&a.1));
        sessions.truncate(limit.max(0) as usize);

        let analyses = self.analyses.lock();
        Ok(sessions
            .into_iter()
            .filter_map(|(session_id, _)| analyses.get(&session_id).cloned())
            .collect())
    }

    async fn insert_chat_message(&self, message: &ChatRecord) -> Result<(), RepoError> {
        self.chats.lock().push(message.clone());
        Ok(())
    }

    async fn chat_messages(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatRecord>, RepoError> {
        let mut records: Vec<ChatRecord> = self
            .chats
            .lock()
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        if limit > 0 && records.len() > limit as usize {
            records = records.split_off(records.len() - limit as usize);
        }
        Ok(records)
    }

    async fn has_assistant_message(&self, session_id: &str) -> Result<bool, RepoError> {
        Ok(self.chats.lock().iter().any(|c| {
            c.session_id == session_id
                && c.role == disleksia_backend::domain::ChatRole::Assistant
        }))
    }
}

/// Scripted model double: queued responses per method, recorded calls,
/// availability independent of the queues.
pub struct ScriptedLlm {
    available: bool,
    json_responses: Mutex<VecDeque<Result<String, &'static str>>>,
    chat_responses: Mutex<VecDeque<Result<String, &'static str>>>,
    pub json_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub chat_seen: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedLlm {
    fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available,
            json_responses: Mutex::new(VecDeque::new()),
            chat_responses: Mutex::new(VecDeque::new()),
            json_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            chat_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Self::new(false)
    }

    pub fn available() -> Arc<Self> {
        Self::new(true)
    }

    pub fn push_json(self: &Arc<Self>, response: Result<&str, &'static str>) -> Arc<Self> {
        self.json_responses
            .lock()
            .push_back(response.map(str::to_string));
        Arc::clone(self)
    }

    pub fn push_chat(self: &Arc<Self>, response: Result<&str, &'static str>) -> Arc<Self> {
        self.chat_responses
            .lock()
            .push_back(response.map(str::to_string));
        Arc::clone(self)
    }
}

#[async_trait]
impl TextGeneration for ScriptedLlm {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn generate_json(&self, _prompt: &str) -> Result<String, LlmError> {
        self.json_calls.fetch_add(1, Ordering::SeqCst);
        match self.json_responses.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(LlmError::NotConfigured(reason)),
            None => Err(LlmError::EmptyChoices),
        }
    }

    async fn chat(&self, messages: &[ChatTurn]) -> Result<String, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_seen.lock().push(messages.to_vec());
        match self.chat_responses.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(LlmError::NotConfigured(reason)),
            None => Err(LlmError::EmptyChoices),
        }
    }
}

pub fn engine(repo: Arc<MemoryRepository>, llm: Arc<ScriptedLlm>) -> QuestionEngine {
    QuestionEngine::with_rng_seed(repo, llm, 7)
}

pub fn stored_question(question_id: &str, difficulty: Difficulty, pair: LetterPair) -> StoredQuestion {
    StoredQuestion {
        question_id: question_id.to_string(),
        difficulty,
        question_text: "Pilih kata yang benar".to_string(),
        target_letter_pair: pair,
        target_letter: "B".to_string(),
        options: vec![
            "BATU".to_string(),
            "DATU".to_string(),
            "MATU".to_string(),
            "SATU".to_string(),
        ],
        correct_answer: "BATU".to_string(),
        hint: None,
        generated_by: GenerationSource::Ai,
        usage_count: 0,
    }
}

pub fn answer_record(
    user_id: &str,
    session_id: &str,
    question_id: &str,
    difficulty: Difficulty,
    is_correct: bool,
    answered_at: DateTime<Utc>,
) -> AnswerRecord {
    AnswerRecord {
        id: format!("a-{session_id}-{question_id}"),
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
        question_id: question_id.to_string(),
        user_answer: (if is_correct { "BATU" } else { "DATU" }).to_string(),
        correct_answer: "BATU".to_string(),
        is_correct,
        question_text: "Pilih kata yang benar".to_string(),
        difficulty,
        answered_at,
    }
}
