use std::sync::Arc;
use std::time::Instant;

use crate::db::DatabaseProxy;
use crate::engine::QuestionEngine;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    db: Arc<DatabaseProxy>,
    engine: QuestionEngine,
}

impl AppState {
    pub fn new(db: Arc<DatabaseProxy>, engine: QuestionEngine) -> Self {
        Self {
            started_at: Instant::now(),
            db,
            engine,
        }
    }

    pub fn db(&self) -> &DatabaseProxy {
        &self.db
    }

    pub fn engine(&self) -> &QuestionEngine {
        &self.engine
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
