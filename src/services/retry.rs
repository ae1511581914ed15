use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Bounded retry with linear backoff: the delay before attempt N+1 is
/// `base_delay * N`. Both the analysis and chat paths use the same policy so
/// the loop lives here instead of being duplicated.
///
/// The backoff sleep runs inside the caller's future, so dropping the request
/// cancels the retry loop along with everything else.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub const fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts.max(1) {
                        return Err(err);
                    }
                    warn!(label, attempt, error = %err, "attempt failed, retrying");
                    sleep(self.base_delay * attempt).await;
                }
            }
        }
    }
}
