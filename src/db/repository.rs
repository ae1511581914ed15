use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::DatabaseProxy;
use crate::domain::{
    AnswerRecord, ChatRecord, ChatRole, Difficulty, ErrorPattern, GenerationSource, LetterPair,
    OverallValue, QuestionRepository, RepoError, SessionAnalysis, StoredQuestion,
};

/// Postgres-backed implementation of [`QuestionRepository`].
#[derive(Clone)]
pub struct PgQuestionRepository {
    db: DatabaseProxy,
}

impl PgQuestionRepository {
    pub fn new(db: DatabaseProxy) -> Self {
        Self { db }
    }
}

fn map_generated(row: &PgRow) -> Result<StoredQuestion, RepoError> {
    let difficulty: String = row.try_get("difficulty").map_err(RepoError::Database)?;
    let pair: String = row.try_get("target_letter_pair").map_err(RepoError::Database)?;
    let options_json: String = row.try_get("options").map_err(RepoError::Database)?;
    let generated_by: String = row.try_get("generated_by").map_err(RepoError::Database)?;

    Ok(StoredQuestion {
        question_id: row.try_get("question_id").map_err(RepoError::Database)?,
        difficulty: difficulty.parse::<Difficulty>().map_err(RepoError::Data)?,
        question_text: row.try_get("question_text").map_err(RepoError::Database)?,
        target_letter_pair: pair.parse::<LetterPair>().map_err(RepoError::Data)?,
        target_letter: row.try_get("target_letter").map_err(RepoError::Database)?,
        options: serde_json::from_str(&options_json)
            .map_err(|e| RepoError::Data(format!("bad options json: {e}")))?,
        correct_answer: row.try_get("correct_answer").map_err(RepoError::Database)?,
        hint: row.try_get("hint").map_err(RepoError::Database)?,
        generated_by: generated_by
            .parse::<GenerationSource>()
            .map_err(RepoError::Data)?,
        usage_count: row.try_get("usage_count").map_err(RepoError::Database)?,
    })
}

fn map_answer(row: &PgRow) -> Result<AnswerRecord, RepoError> {
    let difficulty: Option<String> = row.try_get("difficulty").map_err(RepoError::Database)?;
    let answered_at: DateTime<Utc> = row.try_get("answered_at").map_err(RepoError::Database)?;

    Ok(AnswerRecord {
        id: row.try_get("id").map_err(RepoError::Database)?,
        user_id: row.try_get("user_id").map_err(RepoError::Database)?,
        session_id: row.try_get("session_id").map_err(RepoError::Database)?,
        question_id: row.try_get("question_id").map_err(RepoError::Database)?,
        user_answer: row.try_get("user_answer").map_err(RepoError::Database)?,
        correct_answer: row.try_get("correct_answer").map_err(RepoError::Database)?,
        is_correct: row.try_get("is_correct").map_err(RepoError::Database)?,
        question_text: row
            .try_get::<Option<String>, _>("question_text")
            .map_err(RepoError::Database)?
            .unwrap_or_default(),
        difficulty: difficulty
            .as_deref()
            .unwrap_or("easy")
            .parse::<Difficulty>()
            .map_err(RepoError::Data)?,
        answered_at,
    })
}

fn map_analysis(row: &PgRow) -> Result<SessionAnalysis, RepoError> {
    let overall: String = row.try_get("overall_value").map_err(RepoError::Database)?;
    let patterns_json: String = row.try_get("error_patterns").map_err(RepoError::Database)?;
    let stats_json: String = row.try_get("difficulty_stats").map_err(RepoError::Database)?;

    let error_patterns: Vec<ErrorPattern> = serde_json::from_str(&patterns_json)
        .map_err(|e| RepoError::Data(format!("bad error patterns json: {e}")))?;
    let difficulty_stats: HashMap<String, i64> = serde_json::from_str(&stats_json)
        .map_err(|e| RepoError::Data(format!("bad difficulty stats json: {e}")))?;

    Ok(SessionAnalysis {
        session_id: row.try_get("session_id").map_err(RepoError::Database)?,
        total_questions: row.try_get("total_questions").map_err(RepoError::Database)?,
        correct_answers: row.try_get("correct_answers").map_err(RepoError::Database)?,
        wrong_answers: row.try_get("wrong_answers").map_err(RepoError::Database)?,
        accuracy_rate: row.try_get("accuracy_rate").map_err(RepoError::Database)?,
        overall_value: OverallValue::from_label(&overall),
        ai_analysis: row.try_get("ai_analysis").map_err(RepoError::Database)?,
        recommendations: row.try_get("recommendations").map_err(RepoError::Database)?,
        error_patterns,
        difficulty_stats,
    })
}

fn map_chat(row: &PgRow) -> Result<ChatRecord, RepoError> {
    let role: String = row.try_get("role").map_err(RepoError::Database)?;
    Ok(ChatRecord {
        session_id: row.try_get("session_id").map_err(RepoError::Database)?,
        role: role.parse::<ChatRole>().map_err(RepoError::Data)?,
        message: row.try_get("message").map_err(RepoError::Database)?,
        created_at: row.try_get("created_at").map_err(RepoError::Database)?,
    })
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn insert_generated(&self, question: &StoredQuestion) -> Result<(), RepoError> {
        let options = serde_json::to_string(&question.options)
            .map_err(|e| RepoError::Data(format!("bad options: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO "generated_questions"
                ("question_id", "difficulty", "question_text", "target_letter_pair",
                 "target_letter", "options", "correct_answer", "hint", "generated_by",
                 "usage_count")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT ("question_id") DO NOTHING
            "#,
        )
        .bind(&question.question_id)
        .bind(question.difficulty.as_str())
        .bind(&question.question_text)
        .bind(question.target_letter_pair.as_str())
        .bind(&question.target_letter)
        .bind(&options)
        .bind(&question.correct_answer)
        .bind(&question.hint)
        .bind(question.generated_by.as_str())
        .bind(question.usage_count)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_generated(&self, question_id: &str) -> Result<Option<StoredQuestion>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM "generated_questions"
            WHERE "question_id" = $1 AND "deleted_at" IS NULL
            "#,
        )
        .bind(question_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(map_generated).transpose()
    }

    async fn random_generated(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        limit: i64,
        exclude_ids: &[String],
    ) -> Result<Vec<StoredQuestion>, RepoError> {
        let pair_strings: Vec<String> = pairs.iter().map(|p| p.as_str().to_string()).collect();
        let exclude: Vec<String> = exclude_ids.to_vec();

        let rows = sqlx::query(
            r#"
            SELECT * FROM "generated_questions"
            WHERE "difficulty" = $1
              AND "deleted_at" IS NULL
              AND ("target_letter_pair" = ANY($2) OR cardinality($2::text[]) = 0)
              AND NOT ("question_id" = ANY($3))
            ORDER BY RANDOM()
            LIMIT $4
            "#,
        )
        .bind(difficulty.as_str())
        .bind(&pair_strings)
        .bind(&exclude)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_generated).collect()
    }

    async fn increment_usage(&self, question_id: &str) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE "generated_questions"
            SET "usage_count" = "usage_count" + 1, "updated_at" = NOW()
            WHERE "question_id" = $1
            "#,
        )
        .bind(question_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn insert_answer(&self, answer: &AnswerRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO "user_answers"
                ("id", "user_id", "session_id", "question_id", "user_answer",
                 "correct_answer", "is_correct", "question_text", "difficulty",
                 "answered_at")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&answer.id)
        .bind(&answer.user_id)
        .bind(&answer.session_id)
        .bind(&answer.question_id)
        .bind(&answer.user_answer)
        .bind(&answer.correct_answer)
        .bind(answer.is_correct)
        .bind(&answer.question_text)
        .bind(answer.difficulty.as_str())
        .bind(answer.answered_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_answer(
        &self,
        user_id: &str,
        session_id: &str,
        question_id: &str,
    ) -> Result<Option<AnswerRecord>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM "user_answers"
            WHERE "user_id" = $1 AND "session_id" = $2 AND "question_id" = $3
              AND "deleted_at" IS NULL
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(question_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(map_answer).transpose()
    }

    async fn answers_by_session(&self, session_id: &str) -> Result<Vec<AnswerRecord>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM "user_answers"
            WHERE "session_id" = $1 AND "deleted_at" IS NULL
            ORDER BY "answered_at" ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_answer).collect()
    }

    async fn upsert_analysis(&self, analysis: &SessionAnalysis) -> Result<(), RepoError> {
        let patterns = serde_json::to_string(&analysis.error_patterns)
            .map_err(|e| RepoError::Data(format!("bad error patterns: {e}")))?;
        let stats = serde_json::to_string(&analysis.difficulty_stats)
            .map_err(|e| RepoError::Data(format!("bad difficulty stats: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO "session_analysis_cache"
                ("session_id", "total_questions", "correct_answers", "wrong_answers",
                 "accuracy_rate", "overall_value", "ai_analysis", "recommendations",
                 "error_patterns", "difficulty_stats")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT ("session_id") DO UPDATE SET
                "total_questions" = EXCLUDED."total_questions",
                "correct_answers" = EXCLUDED."correct_answers",
                "wrong_answers" = EXCLUDED."wrong_answers",
                "accuracy_rate" = EXCLUDED."accuracy_rate",
                "overall_value" = EXCLUDED."overall_value",
                "ai_analysis" = EXCLUDED."ai_analysis",
                "recommendations" = EXCLUDED."recommendations",
                "error_patterns" = EXCLUDED."error_patterns",
                "difficulty_stats" = EXCLUDED."difficulty_stats",
                "updated_at" = NOW()
            "#,
        )
        .bind(&analysis.session_id)
        .bind(analysis.total_questions)
        .bind(analysis.correct_answers)
        .bind(analysis.wrong_answers)
        .bind(&analysis.accuracy_rate)
        .bind(analysis.overall_value.as_str())
        .bind(&analysis.ai_analysis)
        .bind(&analysis.recommendations)
        .bind(&patterns)
        .bind(&stats)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_analysis(&self, session_id: &str) -> Result<Option<SessionAnalysis>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM "session_analysis_cache"
            WHERE "session_id" = $1 AND "deleted_at" IS NULL
            "#,
        )
        .bind(session_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(map_analysis).transpose()
    }

    async fn recent_analyses_by_user(
        &self,
        user_id: &str,
        exclude_session_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionAnalysis>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT sac.* FROM "session_analysis_cache" sac
            JOIN (
                SELECT "session_id", MAX("answered_at") AS last_answered
                FROM "user_answers"
                WHERE "user_id" = $1 AND "session_id" <> $2 AND "deleted_at" IS NULL
                GROUP BY "session_id"
            ) recent ON recent."session_id" = sac."session_id"
            WHERE sac."deleted_at" IS NULL
            ORDER BY recent.last_answered DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(exclude_session_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_analysis).collect()
    }

    async fn insert_chat_message(&self, message: &ChatRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO "chat_messages" ("session_id", "role", "message", "created_at")
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&message.session_id)
        .bind(message.role.as_str())
        .bind(&message.message)
        .bind(message.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn chat_messages(&self, session_id: &str, limit: i64) -> Result<Vec<ChatRecord>, RepoError> {
        // most recent `limit` rows, presented oldest first
        let rows = sqlx::query(
            r#"
            SELECT * FROM (
                SELECT * FROM "chat_messages"
                WHERE "session_id" = $1 AND "deleted_at" IS NULL
                ORDER BY "created_at" DESC, "id" DESC
                LIMIT $2
            ) latest
            ORDER BY "created_at" ASC, "id" ASC
            "#,
        )
        .bind(session_id)
        .bind(if limit > 0 { limit } else { i64::MAX })
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_chat).collect()
    }

    async fn has_assistant_message(&self, session_id: &str) -> Result<bool, RepoError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM "chat_messages"
            WHERE "session_id" = $1 AND "role" = 'assistant' AND "deleted_at" IS NULL
            "#,
        )
        .bind(session_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }
}
