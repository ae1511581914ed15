pub mod answers;
pub mod chat;
pub mod fallback;
pub mod generate;
pub mod prompt;
pub mod report;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;
use thiserror::Error;

use crate::domain::{LetterPair, QuestionRepository, RepoError};
use crate::services::llm::{LlmError, TextGeneration};
use crate::services::retry::RetryPolicy;

/// Detached persistence tasks get their own deadline instead of the
/// request's; they must outlive the HTTP response that spawned them.
pub(crate) const DETACHED_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const LLM_RETRY: RetryPolicy = RetryPolicy::linear(3, Duration::from_millis(500));

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("question not found: {0}")]
    QuestionNotFound(String),
    #[error("no answers found for session")]
    NoAnswers,
    #[error("no cached questions available for the requested filters")]
    NoCachedQuestions,
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("assistant unavailable: {0}")]
    Llm(#[from] LlmError),
}

/// Orchestrates question generation, answer recording, session reports and
/// the chatbot. One instance per process; the RNG is shared across concurrent
/// generation tasks behind a mutex.
#[derive(Clone)]
pub struct QuestionEngine {
    pub(crate) repo: Arc<dyn QuestionRepository>,
    pub(crate) llm: Arc<dyn TextGeneration>,
    pub(crate) rng: Arc<Mutex<StdRng>>,
}

impl QuestionEngine {
    pub fn new(repo: Arc<dyn QuestionRepository>, llm: Arc<dyn TextGeneration>) -> Self {
        Self {
            repo,
            llm,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Deterministic RNG variant for tests.
    pub fn with_rng_seed(
        repo: Arc<dyn QuestionRepository>,
        llm: Arc<dyn TextGeneration>,
        seed: u64,
    ) -> Self {
        Self {
            repo,
            llm,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub(crate) fn pick_pair(&self, pairs: &[LetterPair]) -> LetterPair {
        let mut rng = self.rng.lock();
        *pairs.choose(&mut *rng).unwrap_or(&LetterPair::BD)
    }

    pub(crate) fn shuffle_options(&self, options: &mut [String]) {
        let mut rng = self.rng.lock();
        options.shuffle(&mut *rng);
    }
}
