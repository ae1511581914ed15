//! Answer submission: grading, the once-per-question guarantee, and the
//! session answer log.

mod common;

use disleksia_backend::domain::{Difficulty, LetterPair, QuestionRepository};
use disleksia_backend::engine::answers::SubmitAnswerParams;
use disleksia_backend::engine::EngineError;

use common::{engine, stored_question, MemoryRepository, ScriptedLlm};

fn submit(question_id: &str, answer: &str) -> SubmitAnswerParams {
    SubmitAnswerParams {
        user_id: "u-1".into(),
        session_id: "s-1".into(),
        question_id: question_id.into(),
        answer: answer.into(),
    }
}

#[tokio::test]
async fn answers_are_graded_against_the_stored_question() {
    let repo = MemoryRepository::new();
    repo.insert_generated(&stored_question("q-1", Difficulty::Easy, LetterPair::BD))
        .await
        .unwrap();
    let engine = engine(repo, ScriptedLlm::unavailable());

    let right = engine.submit_answer(submit("q-1", " batu ")).await.unwrap();
    assert!(right.is_correct);
    assert_eq!(right.correct_answer, "BATU");

    let wrong = engine
        .submit_answer(SubmitAnswerParams {
            session_id: "s-2".into(),
            ..submit("q-1", "DATU")
        })
        .await
        .unwrap();
    assert!(!wrong.is_correct);
}

#[tokio::test]
async fn resubmitting_an_answer_keeps_the_first_verdict() {
    let repo = MemoryRepository::new();
    repo.insert_generated(&stored_question("q-1", Difficulty::Easy, LetterPair::BD))
        .await
        .unwrap();
    let engine = engine(repo.clone(), ScriptedLlm::unavailable());

    let first = engine.submit_answer(submit("q-1", "DATU")).await.unwrap();
    assert!(!first.is_correct);

    // Same user, session, and question again, this time with the right word.
    let second = engine.submit_answer(submit("q-1", "BATU")).await.unwrap();
    assert!(!second.is_correct);
    assert_eq!(second.user_answer, first.user_answer);
    assert_eq!(second.question_id, first.question_id);
    assert_eq!(repo.answers.lock().len(), 1);
}

#[tokio::test]
async fn unknown_question_is_an_error() {
    let repo = MemoryRepository::new();
    let engine = engine(repo, ScriptedLlm::unavailable());

    let err = engine.submit_answer(submit("q-missing", "BATU")).await.unwrap_err();
    assert!(matches!(err, EngineError::QuestionNotFound(_)));
}

#[tokio::test]
async fn session_log_joins_letter_pairs_and_is_oldest_first() {
    let repo = MemoryRepository::new();
    repo.insert_generated(&stored_question("q-1", Difficulty::Easy, LetterPair::BD))
        .await
        .unwrap();
    repo.insert_generated(&stored_question("q-2", Difficulty::Easy, LetterPair::MW))
        .await
        .unwrap();
    let engine = engine(repo, ScriptedLlm::unavailable());

    engine.submit_answer(submit("q-1", "BATU")).await.unwrap();
    engine.submit_answer(submit("q-2", "DATU")).await.unwrap();

    let log = engine.session_answers("s-1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].question_id, "q-1");
    assert_eq!(log[0].target_letter_pair, "b-d");
    assert_eq!(log[1].target_letter_pair, "m-w");
    assert!(log[1].answered_at >= log[0].answered_at);
}
