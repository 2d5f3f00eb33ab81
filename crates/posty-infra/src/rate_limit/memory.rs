//! In-memory keyed rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use posty_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window for one key.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-key rate limiter using the GCRA algorithm.
///
/// Each key (typically a client address) gets its own bucket that allows a
/// burst of `max_requests` and refills one slot every `window / max_requests`.
/// Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: DefaultKeyedRateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    /// Forget keys whose bucket has refilled completely. Returns how many
    /// were dropped.
    ///
    /// Buckets are never removed on their own, so every client address ever
    /// seen stays in memory until this runs.
    pub fn purge_idle(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => Ok(RateLimitResult::allow()),
            Err(not_until) => Ok(RateLimitResult::deny(
                not_until.wait_time_from(self.clock.now()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn allows_burst_then_rejects() {
        let limiter = limiter(3);
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        }
        let denied = limiter.check("10.0.0.1").await.unwrap();
        assert!(!denied.allowed);
        assert!(denied.reset_after > Duration::ZERO);
    }

    #[tokio::test]
    async fn keys_are_limited_independently() {
        let limiter = limiter(1);
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn purge_drops_only_refilled_keys() {
        let fast = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(10),
        });
        fast.check("10.0.0.1").await.unwrap();
        fast.check("10.0.0.2").await.unwrap();
        assert_eq!(fast.tracked_keys(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fast.purge_idle(), 2);
        assert_eq!(fast.tracked_keys(), 0);
        assert!(fast.check("10.0.0.1").await.unwrap().allowed);

        let slow = limiter(1);
        slow.check("10.0.0.1").await.unwrap();
        assert_eq!(slow.purge_idle(), 0);
        assert!(!slow.check("10.0.0.1").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn zero_max_requests_still_allows_one() {
        let limiter = limiter(0);
        assert!(limiter.check("k").await.unwrap().allowed);
    }
}
