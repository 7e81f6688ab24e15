use std::future::Future;
use std::time::Duration;

/// Retry configuration for holder fetches. Retries wait a fixed delay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryConfig {
    /// A single attempt. Retrying is the calling orchestrator's decision.
    fn default() -> Self {
        Self::none()
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_millis(500),
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Time needed to exhaust every attempt when each one runs for
    /// `per_attempt`, including the delays between them.
    pub fn session_budget(&self, per_attempt: Duration) -> Duration {
        let attempts = self.max_attempts.max(1);
        per_attempt
            .saturating_mul(attempts)
            .saturating_add(self.delay.saturating_mul(attempts - 1))
    }
}

/// Trait for errors that may be retryable
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

/// Execute an async operation with retries.
/// Only retries on transient errors (as determined by IsRetryable trait).
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = config.delay;
                tracing::debug!(
                    attempt = attempt + 1,
                    max = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "retrying holder fetch after transient error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
