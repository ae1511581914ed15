use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::AnswerRecord;
use crate::engine::{EngineError, QuestionEngine};

#[derive(Debug, Clone)]
pub struct SubmitAnswerParams {
    pub user_id: String,
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswerOutcome {
    pub is_correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
    pub question_id: String,
    pub session_id: String,
}

/// One entry of a session's answer log, joined back to the generated
/// question for its letter pair.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerLogEntry {
    pub id: String,
    pub question_id: String,
    pub question_text: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub difficulty: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_letter_pair: String,
    pub answered_at: String,
}

impl QuestionEngine {
    /// Records an answer once per (user, session, question). A repeat submit
    /// returns the already-recorded verdict without writing anything.
    pub async fn submit_answer(
        &self,
        params: SubmitAnswerParams,
    ) -> Result<SubmitAnswerOutcome, EngineError> {
        if let Some(existing) = self
            .repo
            .find_answer(&params.user_id, &params.session_id, &params.question_id)
            .await?
        {
            return Ok(SubmitAnswerOutcome {
                is_correct: existing.is_correct,
                user_answer: existing.user_answer,
                correct_answer: existing.correct_answer,
                question_id: existing.question_id,
                session_id: existing.session_id,
            });
        }

        let question = self
            .repo
            .find_generated(&params.question_id)
            .await?
            .ok_or_else(|| EngineError::QuestionNotFound(params.question_id.clone()))?;

        let is_correct = normalize(&params.answer) == normalize(&question.correct_answer);

        let record = AnswerRecord {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            session_id: params.session_id.clone(),
            question_id: params.question_id.clone(),
            user_answer: params.answer.clone(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
            question_text: question.question_text,
            difficulty: question.difficulty,
            answered_at: Utc::now(),
        };
        self.repo.insert_answer(&record).await?;

        Ok(SubmitAnswerOutcome {
            is_correct,
            user_answer: params.answer,
            correct_answer: question.correct_answer,
            question_id: params.question_id,
            session_id: params.session_id,
        })
    }

    /// The session's full answer log, oldest first. Questions evicted from
    /// the cache leave their letter pair blank rather than failing the list.
    pub async fn session_answers(
        &self,
        session_id: &str,
    ) -> Result<Vec<AnswerLogEntry>, EngineError> {
        let answers = self.repo.answers_by_session(session_id).await?;

        let mut entries = Vec::with_capacity(answers.len());
        for answer in answers {
            let target_letter_pair = match self.repo.find_generated(&answer.question_id).await? {
                Some(question) => question.target_letter_pair.as_str().to_string(),
                None => String::new(),
            };

            entries.push(AnswerLogEntry {
                id: answer.id,
                question_id: answer.question_id,
                question_text: answer.question_text,
                user_answer: answer.user_answer,
                correct_answer: answer.correct_answer,
                is_correct: answer.is_correct,
                difficulty: answer.difficulty.as_str().to_string(),
                target_letter_pair,
                answered_at: answer.answered_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            });
        }
        Ok(entries)
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_compare_case_and_whitespace_insensitively() {
        assert_eq!(normalize("  batu "), "BATU");
        assert_eq!(normalize("Batu"), normalize("BATU"));
        assert_ne!(normalize("DATU"), normalize("BATU"));
    }
}
