use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty tiers for generated questions. Defaults to the easiest tier
/// when a request leaves it empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("invalid difficulty: {other}")),
        }
    }
}

/// Visually confusable letter pairs the question bank targets. The set is
/// closed: any other pattern in a request is a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterPair {
    #[serde(rename = "b-d")]
    BD,
    #[serde(rename = "p-q")]
    PQ,
    #[serde(rename = "m-w")]
    MW,
    #[serde(rename = "n-u")]
    NU,
    #[serde(rename = "m-n")]
    MN,
}

impl LetterPair {
    pub const ALL: [LetterPair; 5] = [
        LetterPair::BD,
        LetterPair::PQ,
        LetterPair::MW,
        LetterPair::NU,
        LetterPair::MN,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterPair::BD => "b-d",
            LetterPair::PQ => "p-q",
            LetterPair::MW => "m-w",
            LetterPair::NU => "n-u",
            LetterPair::MN => "m-n",
        }
    }
}

impl fmt::Display for LetterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b-d" => Ok(LetterPair::BD),
            "p-q" => Ok(LetterPair::PQ),
            "m-w" => Ok(LetterPair::MW),
            "n-u" => Ok(LetterPair::NU),
            "m-n" => Ok(LetterPair::MN),
            other => Err(format!(
                "invalid letter pair: {other} (allowed: b-d, p-q, m-w, n-u, m-n)"
            )),
        }
    }
}

/// Where a cached question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Ai,
    Fallback,
}

impl GenerationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationSource::Ai => "ai",
            GenerationSource::Fallback => "fallback",
        }
    }
}

impl FromStr for GenerationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" => Ok(GenerationSource::Ai),
            "fallback" => Ok(GenerationSource::Fallback),
            other => Err(format!("invalid generation source: {other}")),
        }
    }
}

/// Qualitative performance bands for the session report. Indonesian labels,
/// assigned holistically (error concentration and trend matter, not accuracy
/// alone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallValue {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "sangat baik")]
    SangatBaik,
    #[serde(rename = "baik")]
    Baik,
    #[serde(rename = "cukup")]
    Cukup,
    #[serde(rename = "perlu peningkatan")]
    PerluPeningkatan,
}

impl OverallValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallValue::Excellent => "excellent",
            OverallValue::SangatBaik => "sangat baik",
            OverallValue::Baik => "baik",
            OverallValue::Cukup => "cukup",
            OverallValue::PerluPeningkatan => "perlu peningkatan",
        }
    }

    /// Parses a label from model output. Unknown labels degrade to `Baik`
    /// rather than failing the report.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => OverallValue::Excellent,
            "sangat baik" => OverallValue::SangatBaik,
            "baik" => OverallValue::Baik,
            "cukup" => OverallValue::Cukup,
            "perlu peningkatan" => OverallValue::PerluPeningkatan,
            _ => OverallValue::Baik,
        }
    }
}

impl fmt::Display for OverallValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question as returned to API clients. `answer` is stripped when the
/// caller did not ask for it; the cached copy always keeps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub target_letter_pair: LetterPair,
    pub target_letter: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// A cached question row in `generated_questions`.
#[derive(Debug, Clone)]
pub struct StoredQuestion {
    pub question_id: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub target_letter_pair: LetterPair,
    pub target_letter: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub hint: Option<String>,
    pub generated_by: GenerationSource,
    pub usage_count: i64,
}

/// One `user_answers` row. Created at most once per
/// (user, session, question) triple.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub question_id: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub question_text: String,
    pub difficulty: Difficulty,
    pub answered_at: DateTime<Utc>,
}

/// Per-letter-pair error statistics inside a session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub letter_pair: String,
    pub error_count: i64,
    pub total_count: i64,
    pub error_rate: String,
}

/// One `session_analysis_cache` row: aggregate stats plus the qualitative AI
/// analysis. Upserted per session; the chat engine reads it as context and
/// the report endpoint serializes it as-is.
#[derive(Debug, Clone, Serialize)]
pub struct SessionAnalysis {
    pub session_id: String,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub accuracy_rate: String,
    pub overall_value: OverallValue,
    pub ai_analysis: String,
    pub recommendations: String,
    pub error_patterns: Vec<ErrorPattern>,
    pub difficulty_stats: HashMap<String, i64>,
}

/// One turn in a session's chatbot conversation. Append-only.
#[derive(Debug, Clone)]
pub struct ChatRecord {
    pub session_id: String,
    pub role: ChatRole,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("invalid chat role: {other}")),
        }
    }
}

/// Formats an accuracy/error ratio as "NN.N%".
pub fn format_rate(part: i64, total: i64) -> String {
    if total <= 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_and_defaults() {
        assert_eq!("".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" Medium ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("tricky".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Easy);
    }

    #[test]
    fn letter_pair_rejects_unknown_patterns() {
        assert_eq!("b-d".parse::<LetterPair>().unwrap(), LetterPair::BD);
        assert_eq!("M-N".parse::<LetterPair>().unwrap(), LetterPair::MN);
        assert!("a-z".parse::<LetterPair>().is_err());
        assert!("bd".parse::<LetterPair>().is_err());
    }

    #[test]
    fn overall_value_unknown_label_degrades_to_baik() {
        assert_eq!(OverallValue::from_label("Sangat Baik"), OverallValue::SangatBaik);
        assert_eq!(OverallValue::from_label("luar biasa"), OverallValue::Baik);
    }

    #[test]
    fn rate_formatting_one_decimal() {
        assert_eq!(format_rate(3, 4), "75.0%");
        assert_eq!(format_rate(1, 3), "33.3%");
        assert_eq!(format_rate(0, 0), "0.0%");
    }

    #[test]
    fn question_answer_is_omitted_when_none() {
        let q = Question {
            id: "q-1".into(),
            difficulty: Difficulty::Easy,
            question_text: "Pilih kata yang benar".into(),
            target_letter_pair: LetterPair::BD,
            target_letter: "B".into(),
            options: vec!["BATU".into(), "DATU".into()],
            answer: None,
            hint: None,
        };
        let json = serde_json::to_string(&q).unwrap();
        assert!(!json.contains("\"answer\""));
        assert!(json.contains("\"targetLetterPair\":\"b-d\""));
    }
}
