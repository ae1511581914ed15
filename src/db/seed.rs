use sqlx::PgPool;

use crate::engine::fallback::WORD_BANK;

/// Seeds `question_bank_templates` from the static word bank. Runs once; a
/// non-empty table skips the whole pass.
pub async fn seed_question_bank(pool: &PgPool) {
    let count: Option<i64> = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "question_bank_templates" WHERE "deleted_at" IS NULL"#,
    )
    .fetch_optional(pool)
    .await
    .ok()
    .flatten();

    match count {
        Some(0) => {}
        Some(_) => {
            tracing::debug!("question bank already seeded, skipping");
            return;
        }
        None => {
            tracing::warn!("could not check question bank seed state, skipping");
            return;
        }
    }

    let mut seeded = 0usize;
    for entry in WORD_BANK {
        let distractors = match serde_json::to_string(&entry.distractors) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(template = entry.template_id, error = %err, "failed to encode distractors");
                continue;
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO "question_bank_templates"
                ("template_id", "difficulty", "target_letter_pair", "target_letter",
                 "correct_word", "distractors", "hint")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ("template_id") DO NOTHING
            "#,
        )
        .bind(entry.template_id)
        .bind(entry.difficulty.as_str())
        .bind(entry.pair.as_str())
        .bind(entry.target_letter)
        .bind(entry.correct_word)
        .bind(&distractors)
        .bind(entry.hint)
        .execute(pool)
        .await;

        match result {
            Ok(_) => seeded += 1,
            Err(err) => {
                tracing::warn!(template = entry.template_id, error = %err, "failed to seed template");
            }
        }
    }

    tracing::info!(count = seeded, "seeded question bank templates");
}
