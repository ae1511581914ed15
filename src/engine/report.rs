use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::{
    format_rate, AnswerRecord, ChatRecord, ChatRole, ErrorPattern, OverallValue, SessionAnalysis,
};
use crate::engine::{prompt, EngineError, QuestionEngine, LLM_RETRY};
use crate::services::llm::strip_code_fences;

/// How many prior sessions of the same user feed trend commentary.
const HISTORY_LIMIT: i64 = 5;

const FALLBACK_ANALYSIS: &str =
    "Sesi latihan telah selesai. Terus berlatih untuk meningkatkan kemampuan membaca.";
const FALLBACK_RECOMMENDATIONS: &str = "Fokus pada huruf-huruf yang masih sering tertukar.";

/// Aggregates computed from a session's answers before any AI involvement.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub total_questions: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub accuracy_rate: String,
    pub difficulty_stats: HashMap<String, i64>,
    pub error_patterns: Vec<ErrorPattern>,
}

/// Pure aggregation over a session's answers. `pair_by_question` maps each
/// question ID to its letter pair; answers whose question is missing from
/// the map are counted in the totals but not in any pair pattern.
pub fn compute_session_stats(
    answers: &[AnswerRecord],
    pair_by_question: &HashMap<String, String>,
) -> SessionStats {
    let mut correct = 0i64;
    let mut difficulty_stats: HashMap<String, i64> = HashMap::new();
    let mut pair_errors: HashMap<String, (i64, i64)> = HashMap::new();

    for answer in answers {
        if answer.is_correct {
            correct += 1;
        }
        *difficulty_stats
            .entry(answer.difficulty.as_str().to_string())
            .or_insert(0) += 1;

        if let Some(pair) = pair_by_question.get(&answer.question_id) {
            let entry = pair_errors.entry(pair.clone()).or_insert((0, 0));
            entry.1 += 1;
            if !answer.is_correct {
                entry.0 += 1;
            }
        }
    }

    let total = answers.len() as i64;
    let mut error_patterns: Vec<ErrorPattern> = pair_errors
        .into_iter()
        .map(|(letter_pair, (errors, pair_total))| ErrorPattern {
            error_rate: format_rate(errors, pair_total),
            letter_pair,
            error_count: errors,
            total_count: pair_total,
        })
        .collect();
    // HashMap iteration order is arbitrary; keep the report stable.
    error_patterns.sort_by(|a, b| a.letter_pair.cmp(&b.letter_pair));

    SessionStats {
        total_questions: total,
        correct_answers: correct,
        wrong_answers: total - correct,
        accuracy_rate: format_rate(correct, total),
        difficulty_stats,
        error_patterns,
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    recommendations: String,
    #[serde(default)]
    overall_value: String,
}

impl QuestionEngine {
    /// Builds (and caches) the session report: aggregate stats plus a
    /// qualitative AI analysis. AI failures degrade to fixed neutral text
    /// rather than failing the report.
    pub async fn session_report(&self, session_id: &str) -> Result<SessionAnalysis, EngineError> {
        let answers = self.repo.answers_by_session(session_id).await?;
        if answers.is_empty() {
            return Err(EngineError::NoAnswers);
        }

        let mut pair_by_question: HashMap<String, String> = HashMap::new();
        for answer in &answers {
            if pair_by_question.contains_key(&answer.question_id) {
                continue;
            }
            if let Some(question) = self.repo.find_generated(&answer.question_id).await? {
                pair_by_question.insert(
                    answer.question_id.clone(),
                    question.target_letter_pair.as_str().to_string(),
                );
            }
        }

        let stats = compute_session_stats(&answers, &pair_by_question);

        let user_id = answers[0].user_id.clone();
        let history = self
            .repo
            .recent_analyses_by_user(&user_id, session_id, HISTORY_LIMIT)
            .await?;

        let (ai_analysis, recommendations, overall_value) =
            self.analyze_with_ai(&stats, &history).await;

        let analysis = SessionAnalysis {
            session_id: session_id.to_string(),
            total_questions: stats.total_questions,
            correct_answers: stats.correct_answers,
            wrong_answers: stats.wrong_answers,
            accuracy_rate: stats.accuracy_rate,
            overall_value,
            ai_analysis,
            recommendations,
            error_patterns: stats.error_patterns,
            difficulty_stats: stats.difficulty_stats,
        };
        self.repo.upsert_analysis(&analysis).await?;

        self.seed_first_assistant_message(&analysis).await;

        info!(session_id, total = analysis.total_questions, "session report generated");
        Ok(analysis)
    }

    /// Retries the model a few times, then falls back to neutral Indonesian
    /// text. This path never errors.
    async fn analyze_with_ai(
        &self,
        stats: &SessionStats,
        history: &[SessionAnalysis],
    ) -> (String, String, OverallValue) {
        if !self.llm.is_available() {
            return (
                FALLBACK_ANALYSIS.to_string(),
                FALLBACK_RECOMMENDATIONS.to_string(),
                OverallValue::Baik,
            );
        }

        let prompt = prompt::analysis_prompt(
            stats.total_questions,
            stats.wrong_answers,
            &stats.accuracy_rate,
            &stats.error_patterns,
            history,
        );

        let result: Result<AnalysisPayload, EngineError> = LLM_RETRY
            .run("session-analysis", || {
                let prompt = prompt.clone();
                async move {
                    let raw = self.llm.generate_json(&prompt).await?;
                    serde_json::from_str(strip_code_fences(&raw)).map_err(|e| {
                        EngineError::Validation(format!("analysis output is not valid json: {e}"))
                    })
                }
            })
            .await;

        match result {
            Ok(payload) if !payload.analysis.trim().is_empty() => (
                payload.analysis,
                payload.recommendations,
                OverallValue::from_label(&payload.overall_value),
            ),
            Ok(_) => {
                warn!("analysis output missing analysis text, using fallback");
                (
                    FALLBACK_ANALYSIS.to_string(),
                    FALLBACK_RECOMMENDATIONS.to_string(),
                    OverallValue::Baik,
                )
            }
            Err(err) => {
                warn!(error = %err, "AI analysis failed after retries, using fallback");
                (
                    FALLBACK_ANALYSIS.to_string(),
                    FALLBACK_RECOMMENDATIONS.to_string(),
                    OverallValue::Baik,
                )
            }
        }
    }

    /// Opens the session's chat with the report text, once. Failure only
    /// means the chatbot starts without an opening message.
    async fn seed_first_assistant_message(&self, analysis: &SessionAnalysis) {
        match self.repo.has_assistant_message(&analysis.session_id).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                warn!(session_id = %analysis.session_id, error = %err, "could not check chat history");
                return;
            }
        }

        let record = ChatRecord {
            session_id: analysis.session_id.clone(),
            role: ChatRole::Assistant,
            message: format!("{}\n\n{}", analysis.ai_analysis, analysis.recommendations),
            created_at: Utc::now(),
        };
        if let Err(err) = self.repo.insert_chat_message(&record).await {
            warn!(session_id = %analysis.session_id, error = %err, "failed to store opening chat message");
        }
    }
}
