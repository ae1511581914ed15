use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::domain::{
    Difficulty, GenerationSource, LetterPair, Question, StoredQuestion,
};
use crate::engine::fallback::{self, question_stem, WordBankEntry};
use crate::engine::{prompt, EngineError, QuestionEngine, DETACHED_WRITE_TIMEOUT};
use crate::services::llm::strip_code_fences;

const MIN_COUNT: usize = 1;
const MAX_COUNT: usize = 10;
const MAX_OPTIONS: usize = 4;
/// Bounded replacement attempts when batch members collide with questions
/// already seen in the session.
const MAX_REPLACEMENTS: usize = 5;

#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub difficulty: Difficulty,
    pub count: usize,
    pub include_answer: bool,
    pub pairs: Vec<LetterPair>,
    pub use_ai: bool,
    pub session_id: Option<String>,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            count: 1,
            include_answer: false,
            pairs: Vec::new(),
            use_ai: true,
            session_id: None,
        }
    }
}

/// Parses raw pattern filters into the closed letter-pair set. Any entry
/// outside the vocabulary is a validation error.
pub fn parse_pairs(patterns: &[String]) -> Result<Vec<LetterPair>, EngineError> {
    let mut pairs = Vec::new();
    for raw in patterns {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let pair = LetterPair::from_str(trimmed).map_err(EngineError::Validation)?;
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

/// Deterministic question ID from content, so duplicate persistence attempts
/// are detected by lookup-before-insert.
pub fn question_id(
    correct_word: &str,
    difficulty: Difficulty,
    pair: LetterPair,
    question_text: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(correct_word.as_bytes());
    hasher.update(b"|");
    hasher.update(difficulty.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(pair.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(question_text.as_bytes());
    let digest = hasher.finalize();
    format!("q-{}", hex::encode(&digest[..8]))
}

/// Correct answer first, exact-string duplicates dropped, capped at four.
/// Returns None when fewer than two usable options remain.
pub fn dedupe_options(correct_answer: &str, raw_options: &[String]) -> Option<Vec<String>> {
    let correct = correct_answer.trim();
    if correct.is_empty() {
        return None;
    }

    let mut options: Vec<String> = vec![correct.to_string()];
    for option in raw_options {
        if options.len() >= MAX_OPTIONS {
            break;
        }
        let trimmed = option.trim();
        if trimmed.is_empty() || options.iter().any(|o| o == trimmed) {
            continue;
        }
        options.push(trimmed.to_string());
    }

    if options.len() < 2 {
        return None;
    }
    Some(options)
}

#[derive(Debug, Deserialize)]
struct GenerationPayload {
    #[serde(rename = "questionText", default)]
    question_text: Option<String>,
    #[serde(rename = "correctAnswer", default)]
    correct_answer: Option<String>,
    #[serde(default)]
    options: Vec<String>,
}

impl QuestionEngine {
    /// The generation entry point: clamps `count`, validates filters, and
    /// either serves cached rows (`use_ai=false`) or fans out one concurrent
    /// LLM slot per requested question.
    pub async fn generate(&self, params: GenerateParams) -> Result<Vec<Question>, EngineError> {
        let count = params.count.clamp(MIN_COUNT, MAX_COUNT);
        let pairs = if params.pairs.is_empty() {
            LetterPair::ALL.to_vec()
        } else {
            params.pairs.clone()
        };

        let excluded = match params.session_id.as_deref() {
            Some(session_id) if !session_id.trim().is_empty() => {
                self.answered_question_ids(session_id).await?
            }
            _ => HashSet::new(),
        };

        let mut questions = if params.use_ai {
            self.generate_with_fanout(params.difficulty, &pairs, count, &excluded)
                .await
        } else {
            self.from_cache(params.difficulty, &pairs, count, &excluded)
                .await?
        };

        if !params.include_answer {
            for question in &mut questions {
                question.answer = None;
            }
        }

        Ok(questions)
    }

    async fn answered_question_ids(
        &self,
        session_id: &str,
    ) -> Result<HashSet<String>, EngineError> {
        let answers = self.repo.answers_by_session(session_id).await?;
        Ok(answers.into_iter().map(|a| a.question_id).collect())
    }

    /// Cached retrieval path: previously generated questions for the
    /// difficulty and allowed pairs, minus everything already answered in
    /// the session. Stored options are re-shuffled for variety.
    async fn from_cache(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        count: usize,
        excluded: &HashSet<String>,
    ) -> Result<Vec<Question>, EngineError> {
        let exclude_ids: Vec<String> = excluded.iter().cloned().collect();
        let rows = self
            .repo
            .random_generated(difficulty, pairs, count as i64, &exclude_ids)
            .await?;

        if rows.is_empty() {
            return Err(EngineError::NoCachedQuestions);
        }

        let mut questions = Vec::with_capacity(rows.len());
        for stored in rows {
            self.increment_usage_detached(stored.question_id.clone());

            let mut options = stored.options.clone();
            self.shuffle_options(&mut options);

            questions.push(Question {
                id: stored.question_id,
                difficulty: stored.difficulty,
                question_text: stored.question_text,
                target_letter_pair: stored.target_letter_pair,
                target_letter: stored.target_letter,
                options,
                answer: Some(stored.correct_answer),
                hint: stored.hint,
            });
        }
        Ok(questions)
    }

    /// AI path: one concurrent task per slot, then a bounded replacement
    /// loop for slots that could not claim a fresh question. Slots share a
    /// claimed-ID set seeded with the session's answered questions, so a
    /// batch never repeats itself or the session history. A shortfall after
    /// replacements is returned as-is, not an error.
    async fn generate_with_fanout(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        count: usize,
        excluded: &HashSet<String>,
    ) -> Vec<Question> {
        let claimed = Arc::new(Mutex::new(excluded.clone()));

        let mut handles = Vec::with_capacity(count);
        for slot in 0..count {
            let engine = self.clone();
            let pairs = pairs.to_vec();
            let claimed = Arc::clone(&claimed);
            handles.push(tokio::spawn(async move {
                let question = engine.generate_slot(difficulty, &pairs, &claimed).await;
                (slot, question)
            }));
        }

        let mut batch: Vec<Option<Question>> = (0..count).map(|_| None).collect();
        for handle in futures::future::join_all(handles).await {
            match handle {
                Ok((slot, question)) => batch[slot] = question,
                Err(err) => warn!(error = %err, "generation slot panicked"),
            }
        }

        let mut questions: Vec<Question> = batch.into_iter().flatten().collect();

        let mut replacements = 0;
        while questions.len() < count && replacements < MAX_REPLACEMENTS {
            replacements += 1;
            if let Some(question) = self.generate_slot(difficulty, pairs, &claimed).await {
                questions.push(question);
            }
        }

        if questions.len() < count {
            warn!(
                requested = count,
                produced = questions.len(),
                "returning fewer questions than requested after replacement attempts"
            );
        }

        questions
    }

    /// One slot: random pair, AI generation when available, fixed word bank
    /// otherwise or on any AI failure. Returns None only when every usable
    /// bank entry has already been claimed.
    async fn generate_slot(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        claimed: &Mutex<HashSet<String>>,
    ) -> Option<Question> {
        if self.llm.is_available() {
            match self.generate_with_ai(difficulty, self.pick_pair(pairs)).await {
                Ok(question) => {
                    if claimed.lock().insert(question.id.clone()) {
                        self.persist_generated_detached(&question, GenerationSource::Ai);
                        return Some(question);
                    }
                    debug!(id = %question.id, "model repeated a claimed question, drawing from the bank");
                }
                Err(err) => {
                    debug!(error = %err, "AI generation failed, using fallback bank");
                }
            }
        }
        self.fallback_question(difficulty, pairs, claimed)
    }

    async fn generate_with_ai(
        &self,
        difficulty: Difficulty,
        pair: LetterPair,
    ) -> Result<Question, EngineError> {
        let raw = self
            .llm
            .generate_json(&prompt::generation_prompt(difficulty, pair))
            .await?;

        let payload: GenerationPayload = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| EngineError::Validation(format!("model output is not valid json: {e}")))?;

        let correct = payload
            .correct_answer
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EngineError::Validation("model output missing correctAnswer".into()))?
            .to_string();

        let mut options = dedupe_options(&correct, &payload.options)
            .ok_or_else(|| EngineError::Validation("fewer than 2 usable options".into()))?;
        self.shuffle_options(&mut options);

        let target_letter: String = correct
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default();

        let question_text = payload
            .question_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| question_stem(&target_letter));

        Ok(Question {
            id: question_id(&correct, difficulty, pair, &question_text),
            difficulty,
            question_text,
            target_letter_pair: pair,
            target_letter,
            options,
            answer: Some(correct),
            hint: None,
        })
    }

    /// Draws an unclaimed word-bank entry, preferring a uniformly chosen
    /// pair but widening to all allowed pairs when that pair is exhausted.
    /// Bank questions carry the requested difficulty, matching their IDs.
    fn fallback_question(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        claimed: &Mutex<HashSet<String>>,
    ) -> Option<Question> {
        let preferred = self.pick_pair(pairs);

        let mut guard = claimed.lock();
        let (entry, id) = self
            .pick_bank_entry(difficulty, &[preferred], &guard)
            .or_else(|| self.pick_bank_entry(difficulty, pairs, &guard))?;
        guard.insert(id.clone());
        drop(guard);

        let mut options: Vec<String> = std::iter::once(entry.correct_word)
            .chain(entry.distractors)
            .map(str::to_string)
            .collect();
        self.shuffle_options(&mut options);

        Some(Question {
            id,
            difficulty,
            question_text: question_stem(entry.target_letter),
            target_letter_pair: entry.pair,
            target_letter: entry.target_letter.to_string(),
            options,
            answer: Some(entry.correct_word.to_string()),
            hint: Some(entry.hint.to_string()),
        })
    }

    fn pick_bank_entry(
        &self,
        difficulty: Difficulty,
        pairs: &[LetterPair],
        claimed: &HashSet<String>,
    ) -> Option<(&'static WordBankEntry, String)> {
        let mut pool: Vec<(&'static WordBankEntry, String)> = Vec::new();
        for &pair in pairs {
            for entry in fallback::candidates(pair, difficulty) {
                let id = question_id(
                    entry.correct_word,
                    difficulty,
                    entry.pair,
                    &question_stem(entry.target_letter),
                );
                if !claimed.contains(&id) {
                    pool.push((entry, id));
                }
            }
        }
        if pool.is_empty() {
            return None;
        }
        let index = self.rng.lock().random_range(0..pool.len());
        Some(pool.swap_remove(index))
    }

    /// Best-effort cache write for a successful AI generation. Detached from
    /// the request with its own deadline; failures are logged only.
    fn persist_generated_detached(&self, question: &Question, source: GenerationSource) {
        let Some(answer) = question.answer.clone() else {
            return;
        };
        let stored = StoredQuestion {
            question_id: question.id.clone(),
            difficulty: question.difficulty,
            question_text: question.question_text.clone(),
            target_letter_pair: question.target_letter_pair,
            target_letter: question.target_letter.clone(),
            options: question.options.clone(),
            correct_answer: answer,
            hint: question.hint.clone(),
            generated_by: source,
            usage_count: 1,
        };
        let repo = self.repo.clone();

        tokio::spawn(async move {
            let write = async {
                match repo.find_generated(&stored.question_id).await {
                    Ok(Some(_)) => repo.increment_usage(&stored.question_id).await,
                    Ok(None) => repo.insert_generated(&stored).await,
                    Err(err) => Err(err),
                }
            };
            match tokio::time::timeout(DETACHED_WRITE_TIMEOUT, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(id = %stored.question_id, error = %err, "failed to cache generated question");
                }
                Err(_) => {
                    warn!(id = %stored.question_id, "caching generated question timed out");
                }
            }
        });
    }

    fn increment_usage_detached(&self, question_id: String) {
        let repo = self.repo.clone();
        tokio::spawn(async move {
            let write = repo.increment_usage(&question_id);
            match tokio::time::timeout(DETACHED_WRITE_TIMEOUT, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(id = %question_id, error = %err, "failed to increment usage count");
                }
                Err(_) => warn!(id = %question_id, "usage count increment timed out"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pairs_parse_and_reject_unknown() {
        let pairs = parse_pairs(&["b-d".into(), " p-q ".into(), "b-d".into()]).unwrap();
        assert_eq!(pairs, vec![LetterPair::BD, LetterPair::PQ]);

        let err = parse_pairs(&["x-y".into()]).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn blank_patterns_are_ignored() {
        assert!(parse_pairs(&["".into(), "  ".into()]).unwrap().is_empty());
    }

    #[test]
    fn question_id_is_deterministic_and_content_sensitive() {
        let a = question_id("BATU", Difficulty::Easy, LetterPair::BD, "Pilih kata");
        let b = question_id("BATU", Difficulty::Easy, LetterPair::BD, "Pilih kata");
        let c = question_id("BATU", Difficulty::Medium, LetterPair::BD, "Pilih kata");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("q-"));
        assert_eq!(a.len(), 2 + 16);
    }

    #[test]
    fn dedupe_keeps_correct_answer_first_and_drops_repeats() {
        let options = dedupe_options(
            "BATU",
            &["DATU".into(), "BATU".into(), "DATU".into(), "MATU".into(), "SATU".into()],
        )
        .unwrap();
        assert_eq!(options[0], "BATU");
        assert_eq!(options.len(), 4);
        let unique: std::collections::HashSet<_> = options.iter().collect();
        assert_eq!(unique.len(), options.len());
    }

    #[test]
    fn dedupe_fails_below_two_unique_options() {
        assert!(dedupe_options("BATU", &["BATU".into(), " ".into()]).is_none());
        assert!(dedupe_options("", &["DATU".into()]).is_none());
        assert!(dedupe_options("BATU", &["DATU".into()]).is_some());
    }

    proptest! {
        #[test]
        fn dedupe_output_is_unique_and_answer_bearing(
            correct in "[A-Z]{3,8}",
            raw in proptest::collection::vec("[A-Z]{0,8}", 0..8),
        ) {
            if let Some(options) = dedupe_options(&correct, &raw) {
                prop_assert!(options.len() >= 2 && options.len() <= 4);
                prop_assert_eq!(&options[0], &correct);
                let unique: std::collections::HashSet<_> = options.iter().collect();
                prop_assert_eq!(unique.len(), options.len());
                prop_assert!(options.iter().all(|o| !o.trim().is_empty()));
            }
        }
    }
}
