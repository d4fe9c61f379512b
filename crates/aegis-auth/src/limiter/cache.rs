//! Attempt limiter over a shared [`CacheProvider`].
//!
//! Suitable for multi-node deployments: a reservation is one atomic
//! windowed increment of the token's counter, and the lockout is a marker
//! key with the cool-down as its TTL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use aegis_cache::keys;
use aegis_core::config::LimiterConfig;
use aegis_core::error::AppError;
use aegis_core::traits::cache::CacheProvider;

use super::{AttemptLimiter, AttemptPermit, AttemptState, locked_out, state_after};

/// Cache-backed attempt limiter.
#[derive(Debug, Clone)]
pub struct CacheAttemptLimiter {
    cache: Arc<dyn CacheProvider>,
    max_failed_attempts: u32,
    window: Duration,
    lockout: Duration,
}

impl CacheAttemptLimiter {
    pub fn new(cache: Arc<dyn CacheProvider>, config: &LimiterConfig) -> Self {
        Self {
            cache,
            max_failed_attempts: config.max_failed_attempts,
            window: config.window(),
            lockout: config.lockout(),
        }
    }
}

#[async_trait]
impl AttemptLimiter for CacheAttemptLimiter {
    async fn try_acquire(&self, token: &str) -> Result<AttemptPermit, AppError> {
        if self.cache.exists(&keys::attempt_lockout(token)).await? {
            return Err(locked_out());
        }

        let count = self
            .cache
            .incr_with_ttl(&keys::attempt_failures(token), self.window)
            .await?;
        let attempt = u32::try_from(count).unwrap_or(u32::MAX);
        if attempt > self.max_failed_attempts {
            debug!(attempt, "All attempt slots taken");
            return Err(locked_out());
        }
        // A lockout lands before its counter reset, so an increment that
        // raced past the first check still sees the marker here.
        if self.cache.exists(&keys::attempt_lockout(token)).await? {
            return Err(locked_out());
        }
        Ok(AttemptPermit::new(token, attempt))
    }

    async fn record_failure(&self, permit: AttemptPermit) -> Result<AttemptState, AppError> {
        let outcome = state_after(permit.attempt(), self.max_failed_attempts);
        if outcome == AttemptState::LockedOut {
            self.cache
                .set(&keys::attempt_lockout(permit.token()), "1", self.lockout)
                .await?;
            self.cache
                .delete(&keys::attempt_failures(permit.token()))
                .await?;
            warn!(attempt = permit.attempt(), "Share token locked out");
        } else {
            debug!(attempt = permit.attempt(), "Failed share password attempt");
        }
        Ok(outcome)
    }

    async fn release(&self, permit: AttemptPermit) -> Result<(), AppError> {
        self.cache
            .delete(&keys::attempt_failures(permit.token()))
            .await
    }
}
