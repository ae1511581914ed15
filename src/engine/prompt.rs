use std::fmt::Write as _;

use crate::domain::{Difficulty, ErrorPattern, LetterPair, SessionAnalysis};

/// Prompt for one free-form question generation slot. The model must answer
/// with strict JSON; fences are tolerated and stripped by the caller.
pub fn generation_prompt(difficulty: Difficulty, pair: LetterPair) -> String {
    format!(
        r#"You are generating a multiple-choice reading question for Indonesian dyslexic children (TK-SD).

Design principles:
- Keep instructions very short, friendly, and clear
- High letter contrast: use UPPERCASE words in options
- The correct word and every distractor must be real-looking Indonesian words that differ mainly in the confusable letters
- Exactly 4 options: 1 correct word and 3 visually-confusable distractors

Difficulty: {difficulty}
Target letter pair: {pair}

Task:
Create a questionText in Indonesian asking the child to pick the correctly
spelled word, the correct word itself, and an options array of 4 UPPERCASE
words containing the correct word and 3 distractors.

IMPORTANT: Return ONLY valid JSON with NO additional text, NO markdown formatting, NO code blocks.
JSON format:
{{"questionText":"...","correctAnswer":"...","options":["...","...","...","..."]}}"#
    )
}

/// Prompt for the qualitative session analysis. Includes aggregate stats,
/// the per-pair error table, and prior-session summaries for trend
/// commentary when the user has any.
pub fn analysis_prompt(
    total_questions: i64,
    wrong_answers: i64,
    accuracy_rate: &str,
    error_patterns: &[ErrorPattern],
    history: &[SessionAnalysis],
) -> String {
    let mut prompt = format!(
        r#"Analyze this dyslexia learning session data for an Indonesian child (TK-SD level):

Total Questions: {total_questions}
Accuracy Rate: {accuracy_rate}
Wrong Answers: {wrong_answers}

Error Patterns by Letter Pairs:
"#
    );

    for pattern in error_patterns {
        let _ = writeln!(
            prompt,
            "- {}: {} errors out of {} questions ({})",
            pattern.letter_pair, pattern.error_count, pattern.total_count, pattern.error_rate
        );
    }

    if history.is_empty() {
        prompt.push_str("\nThis is the child's first recorded session; there is no history to compare against.\n");
    } else {
        prompt.push_str("\nPrevious sessions (most recent first), for trend comparison:\n");
        for past in history {
            let _ = writeln!(
                prompt,
                "- {} questions, accuracy {}, overall \"{}\"",
                past.total_questions, past.accuracy_rate, past.overall_value
            );
        }
        prompt.push_str(
            "Comment on whether the child is improving, declining, or staying consistent compared to these sessions.\n",
        );
    }

    prompt.push_str(
        r#"
Task:
1. Provide a brief, caring analysis in Indonesian about the child's learning patterns
2. Identify which letter pairs need most attention
3. Give 2-3 specific, actionable recommendations for improvement
4. Determine overall performance level by considering MULTIPLE factors:
   - Accuracy rate (primary factor)
   - Error patterns and consistency (which letter pairs are most problematic)
   - Error rate per letter pair (high error rate on specific pairs indicates focused difficulty)
   - Number of total questions attempted (shows engagement)
   - Trend across sessions (improvement or consistent mistakes)

Return response as JSON with three fields:
{"analysis":"...","recommendations":"...","overall_value":"..."}

For overall_value, use one of these terms based on HOLISTIC evaluation:
- "excellent" (90-100% accuracy, minimal/no consistent error patterns, good engagement)
- "sangat baik" (80-89% accuracy, few errors, minor patterns, good progress)
- "baik" (70-79% accuracy, some error patterns, showing improvement potential)
- "cukup" (60-69% accuracy, notable error patterns, needs focused practice)
- "perlu peningkatan" (below 60% accuracy, significant error patterns, needs intensive support)

IMPORTANT: Don't judge only by accuracy percentage. A child with 75% accuracy but consistent errors on one specific letter pair might need different evaluation than one with same accuracy but random errors.

Keep the language simple, encouraging, and suitable for parents/teachers of young children."#,
    );

    prompt
}

/// System prompt for the chatbot, built from the cached session analysis.
pub fn chat_system_prompt(analysis: &SessionAnalysis) -> String {
    let mut pairs = String::new();
    for pattern in &analysis.error_patterns {
        let _ = writeln!(
            pairs,
            "- {}: {} salah dari {} soal ({})",
            pattern.letter_pair, pattern.error_count, pattern.total_count, pattern.error_rate
        );
    }
    if pairs.is_empty() {
        pairs.push_str("- (tidak ada data pola kesalahan)\n");
    }

    format!(
        r#"Kamu adalah teman belajar yang ramah untuk anak Indonesia dengan disleksia (usia TK-SD).

Data sesi latihan anak ini:
- Total soal: {total}
- Jawaban benar: {correct}
- Jawaban salah: {wrong}
- Akurasi: {accuracy}
- Penilaian keseluruhan: {overall}

Pola kesalahan per pasangan huruf:
{pairs}
Analisis: {analysis}
Rekomendasi: {recommendations}

Aturan menjawab:
- Selalu gunakan bahasa Indonesia yang sederhana dan ramah anak
- Beri semangat dan pujian atas usaha, jangan mengkritik
- Saat anak bertanya tentang soal, beri petunjuk kecil, jangan langsung jawabannya
- Gunakan emoji sesekali saja, jangan berlebihan
- Jawab singkat, 2-4 kalimat"#,
        total = analysis.total_questions,
        correct = analysis.correct_answers,
        wrong = analysis.wrong_answers,
        accuracy = analysis.accuracy_rate,
        overall = analysis.overall_value,
        pairs = pairs,
        analysis = analysis.ai_analysis,
        recommendations = analysis.recommendations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OverallValue;
    use std::collections::HashMap;

    fn sample_analysis() -> SessionAnalysis {
        SessionAnalysis {
            session_id: "s-1".into(),
            total_questions: 4,
            correct_answers: 3,
            wrong_answers: 1,
            accuracy_rate: "75.0%".into(),
            overall_value: OverallValue::Baik,
            ai_analysis: "Cukup baik".into(),
            recommendations: "Latihan b-d".into(),
            error_patterns: vec![ErrorPattern {
                letter_pair: "b-d".into(),
                error_count: 1,
                total_count: 2,
                error_rate: "50.0%".into(),
            }],
            difficulty_stats: HashMap::new(),
        }
    }

    #[test]
    fn analysis_prompt_notes_first_session() {
        let prompt = analysis_prompt(4, 1, "75.0%", &[], &[]);
        assert!(prompt.contains("first recorded session"));
    }

    #[test]
    fn analysis_prompt_lists_history() {
        let prompt = analysis_prompt(4, 1, "75.0%", &[], &[sample_analysis()]);
        assert!(prompt.contains("Previous sessions"));
        assert!(prompt.contains("accuracy 75.0%"));
    }

    #[test]
    fn chat_prompt_embeds_cached_stats() {
        let prompt = chat_system_prompt(&sample_analysis());
        assert!(prompt.contains("Akurasi: 75.0%"));
        assert!(prompt.contains("b-d: 1 salah dari 2 soal"));
        assert!(prompt.contains("jangan langsung jawabannya"));
    }
}
