//! Rate limiting port, used to throttle login attempts.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one attempt for `key` (a client address) and report whether
    /// it is within the limit.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Outcome of one [`RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// How long until the next attempt would be allowed; zero when allowed.
    pub reset_after: Duration,
}

impl RateLimitResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reset_after: Duration::ZERO,
        }
    }

    pub fn deny(reset_after: Duration) -> Self {
        Self {
            allowed: false,
            reset_after,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limiter backend failed: {0}")]
    Backend(String),
}
