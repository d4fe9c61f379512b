//! In-memory attempt limiter using a Tokio mutex for single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use aegis_core::config::LimiterConfig;
use aegis_core::error::AppError;

use super::{AttemptLimiter, AttemptPermit, AttemptState, locked_out, state_after};

#[derive(Debug)]
struct TokenState {
    /// Reserved slots in the window: in-flight plus failed.
    attempts: u32,
    window_started: Instant,
    locked_until: Option<Instant>,
}

impl TokenState {
    fn fresh(now: Instant) -> Self {
        Self {
            attempts: 0,
            window_started: now,
            locked_until: None,
        }
    }

    fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_started) >= window && !self.is_locked(now)
    }
}

/// In-memory attempt limiter.
///
/// Suitable for single-node deployments only. Every operation holds the
/// mutex for its whole read-modify-write.
#[derive(Debug, Clone)]
pub struct MemoryAttemptLimiter {
    state: Arc<Mutex<HashMap<String, TokenState>>>,
    max_failed_attempts: u32,
    window: Duration,
    lockout: Duration,
}

impl MemoryAttemptLimiter {
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_failed_attempts: config.max_failed_attempts,
            window: config.window(),
            lockout: config.lockout(),
        }
    }

    /// Number of tokens currently tracked.
    pub async fn tracked(&self) -> usize {
        self.state.lock().await.len()
    }
}

#[async_trait]
impl AttemptLimiter for MemoryAttemptLimiter {
    async fn try_acquire(&self, token: &str) -> Result<AttemptPermit, AppError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.retain(|_, entry| !entry.is_stale(now, self.window));

        let entry = state
            .entry(token.to_string())
            .or_insert_with(|| TokenState::fresh(now));

        if entry.is_locked(now) {
            return Err(locked_out());
        }
        if entry.locked_until.is_some() {
            *entry = TokenState::fresh(now);
        }
        if entry.attempts >= self.max_failed_attempts {
            debug!(attempts = entry.attempts, "All attempt slots taken");
            return Err(locked_out());
        }

        entry.attempts += 1;
        Ok(AttemptPermit::new(token, entry.attempts))
    }

    async fn record_failure(&self, permit: AttemptPermit) -> Result<AttemptState, AppError> {
        let outcome = state_after(permit.attempt(), self.max_failed_attempts);
        if outcome == AttemptState::LockedOut {
            let now = Instant::now();
            let mut state = self.state.lock().await;
            let entry = state
                .entry(permit.token().to_string())
                .or_insert_with(|| TokenState::fresh(now));
            entry.attempts = 0;
            entry.window_started = now;
            entry.locked_until = Some(now + self.lockout);
            warn!(attempt = permit.attempt(), "Share token locked out");
        } else {
            debug!(attempt = permit.attempt(), "Failed share password attempt");
        }
        Ok(outcome)
    }

    async fn release(&self, permit: AttemptPermit) -> Result<(), AppError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let locked = state
            .get(permit.token())
            .is_some_and(|entry| entry.is_locked(now));
        if !locked {
            state.remove(permit.token());
        }
        Ok(())
    }
}
