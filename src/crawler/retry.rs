//! Bounded retry and condition-wait primitives
//!
//! Both are plain loops: a retry never recurses and a wait never outlives its timeout. Callers
//! that must react to a stop request race these futures against the run-control channel.

use crate::config::CoordinatorConfig;
use crate::HarvestError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// How often, and how patiently, a transient failure is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub attempts: u32,
    /// Sleep before the second attempt; doubles each time after that
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_backoff())
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or attempts run out
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    what,
                    attempt,
                    policy.attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Polls `condition` every `poll` until it holds or `timeout` elapses
///
/// Returns true if the condition was met. A timeout is not an error: callers continue
/// optimistically.
pub async fn wait_until<F, Fut>(mut condition: F, timeout: Duration, poll: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}
