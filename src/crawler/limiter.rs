//! Randomized request pacing
//!
//! Every detail-page visit waits on the limiter first. Delays are sampled uniformly from
//! `[min_delay, max_delay]` and then jittered by up to ±10%, so successive visits never fall on a
//! fixed interval.

use crate::config::LimiterConfig;
use crate::crawler::lock;
use rand::Rng;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Multiplicative jitter applied to each sampled delay
const JITTER: f64 = 0.10;

/// Paces remote page visits
///
/// Methods take `&self` so the limiter can be shared between the coordinator and its callers.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    min_floor: Duration,
    last_request: Mutex<Option<Instant>>,
    throttled_until: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration, max_delay: Duration, min_floor: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };

        Self {
            min_delay,
            max_delay,
            min_floor,
            last_request: Mutex::new(None),
            throttled_until: Mutex::new(None),
        }
    }

    pub fn from_config(config: &LimiterConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            Duration::from_millis(config.min_floor_ms),
        )
    }

    /// Samples the next inter-request delay
    pub fn next_delay(&self) -> Duration {
        let mut rng = rand::rng();

        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        let base = if min == max {
            min
        } else {
            rng.random_range(min..=max)
        };

        let factor = 1.0 + rng.random_range(-JITTER..=JITTER);
        Duration::from_millis((base as f64 * factor).max(0.0).round() as u64)
    }

    /// Suspends until the next request is allowed, then records it
    ///
    /// If less than the sampled delay has passed since the previous request only the remainder
    /// is waited; otherwise the minimum floor is applied so an idle period never turns into a
    /// zero-delay burst.
    pub async fn wait(&self) {
        let delay = self.next_delay();
        let last = *lock(&self.last_request);

        let pause = match last {
            Some(last) => {
                let elapsed = last.elapsed();
                if elapsed < delay {
                    delay - elapsed
                } else {
                    self.min_floor
                }
            }
            None => self.min_floor,
        };

        tracing::debug!("Rate limiter waiting {:?}", pause);
        tokio::time::sleep(pause).await;

        *lock(&self.last_request) = Some(Instant::now());
    }

    /// Engages the throttle for `duration`; it clears itself afterwards
    pub fn throttle(&self, duration: Duration) {
        tracing::warn!("Throttling requests for {:?}", duration);
        *lock(&self.throttled_until) = Some(Instant::now() + duration);
    }

    /// Returns true while a throttle is in effect
    pub fn is_throttled(&self) -> bool {
        !self.throttle_remaining().is_zero()
    }

    /// Time left on the current throttle, zero if none
    pub fn throttle_remaining(&self) -> Duration {
        let mut guard = lock(&self.throttled_until);
        match *guard {
            Some(until) => {
                let now = Instant::now();
                if until > now {
                    until - now
                } else {
                    *guard = None;
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&LimiterConfig::default())
    }
}
