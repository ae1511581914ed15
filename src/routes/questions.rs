use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::domain::Difficulty;
use crate::engine::generate::{parse_pairs, GenerateParams};
use crate::engine::answers::SubmitAnswerParams;
use crate::engine::EngineError;
use crate::response::{success, ApiError};
use crate::routes::{
    MSG_GENERATE_FAILED, MSG_GENERATE_SUCCESS, MSG_GET_SESSION_FAILED, MSG_GET_SESSION_SUCCESS,
    MSG_SUBMIT_ANSWER_FAILED, MSG_SUBMIT_ANSWER_SUCCESS,
};
use crate::state::AppState;

/// Collected form of the generation query string. `pattern` can repeat and
/// each value can be comma-separated; the other keys are scalars.
#[derive(Debug, Default)]
struct GenerateQuery {
    difficulty: String,
    count: Option<usize>,
    include_answer: bool,
    use_ai: bool,
    patterns: Vec<String>,
    session_id: Option<String>,
}

impl GenerateQuery {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut query = Self {
            use_ai: true,
            ..Self::default()
        };
        for (key, value) in pairs {
            match key.as_str() {
                "difficulty" => query.difficulty = value.clone(),
                "count" => query.count = value.trim().parse().ok().or(query.count),
                "includeAnswer" => query.include_answer = is_truthy(value),
                "use_ai" => query.use_ai = is_truthy(value),
                "pattern" => query.patterns.extend(value.split(',').map(str::to_string)),
                "session_id" => {
                    query.session_id = Some(value.clone()).filter(|v| !v.trim().is_empty());
                }
                _ => {}
            }
        }
        query
    }
}

/// GET /questions/generate?difficulty=easy&count=1&includeAnswer=false&pattern=b-d&use_ai=true&session_id=...
pub async fn generate(
    State(state): State<AppState>,
    Query(raw_query): Query<Vec<(String, String)>>,
) -> Response {
    let query = GenerateQuery::from_pairs(&raw_query);

    let difficulty = match Difficulty::from_str(&query.difficulty) {
        Ok(difficulty) => difficulty,
        Err(err) => return ApiError::bad_request(MSG_GENERATE_FAILED, err).into_response(),
    };

    let pairs = match parse_pairs(&query.patterns) {
        Ok(pairs) => pairs,
        Err(err) => return ApiError::failed(MSG_GENERATE_FAILED, err).into_response(),
    };

    let params = GenerateParams {
        difficulty,
        count: query.count.unwrap_or(1),
        include_answer: query.include_answer,
        pairs,
        use_ai: query.use_ai,
        session_id: query.session_id,
    };

    match state.engine().generate(params).await {
        Ok(questions) => success(MSG_GENERATE_SUCCESS, questions),
        Err(err) => ApiError::failed(MSG_GENERATE_FAILED, err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    question_id: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

/// POST /questions/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Response {
    let mut missing: BTreeMap<&'static str, String> = BTreeMap::new();
    let require = |missing: &mut BTreeMap<&'static str, String>,
                   field: &'static str,
                   value: &Option<String>| {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                missing.insert(field, format!("{field} is required"));
                None
            }
        }
    };

    let user_id = require(&mut missing, "user_id", &req.user_id);
    let session_id = require(&mut missing, "session_id", &req.session_id);
    let question_id = require(&mut missing, "question_id", &req.question_id);
    let answer = require(&mut missing, "answer", &req.answer);

    if !missing.is_empty() {
        return ApiError::fields(MSG_SUBMIT_ANSWER_FAILED, missing).into_response();
    }

    let params = SubmitAnswerParams {
        user_id: user_id.unwrap_or_default(),
        session_id: session_id.unwrap_or_default(),
        question_id: question_id.unwrap_or_default(),
        answer: answer.unwrap_or_default(),
    };

    match state.engine().submit_answer(params).await {
        Ok(outcome) => success(MSG_SUBMIT_ANSWER_SUCCESS, outcome),
        Err(err) => ApiError::failed(MSG_SUBMIT_ANSWER_FAILED, err).into_response(),
    }
}

/// GET /questions/sessions/:session_id
pub async fn session_answers(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    if session_id.trim().is_empty() {
        return ApiError::failed(
            MSG_GET_SESSION_FAILED,
            EngineError::Validation("session_id is required".into()),
        )
        .into_response();
    }

    match state.engine().session_answers(&session_id).await {
        Ok(entries) => success(MSG_GET_SESSION_SUCCESS, entries),
        Err(err) => ApiError::failed(MSG_GET_SESSION_FAILED, err).into_response(),
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_and_comma_separated_patterns_accumulate() {
        let query = GenerateQuery::from_pairs(&pairs(&[
            ("pattern", "b-d"),
            ("pattern", "p-q,m-w"),
            ("count", "3"),
        ]));
        assert_eq!(query.patterns, vec!["b-d", "p-q", "m-w"]);
        assert_eq!(query.count, Some(3));
        assert!(query.difficulty.is_empty());
    }

    #[test]
    fn absent_keys_keep_their_defaults() {
        let query = GenerateQuery::from_pairs(&pairs(&[("session_id", "  ")]));
        assert_eq!(query.count, None);
        assert!(!query.include_answer);
        assert!(query.use_ai);
        assert!(query.session_id.is_none());
        assert!(query.patterns.is_empty());
    }

    #[test]
    fn truthy_accepts_one_and_true() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" true "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("yes"));
    }
}
