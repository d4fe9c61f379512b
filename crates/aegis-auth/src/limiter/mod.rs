//! Failed-password attempt limiting per share token.
//!
//! Every password check first reserves an attempt slot with
//! [`AttemptLimiter::try_acquire`]. A reservation counts against the
//! threshold until it is settled, so concurrent guesses cannot all slip in
//! before the first failure is recorded. A failed unwrap settles the slot
//! with [`AttemptLimiter::record_failure`]; a successful one clears the
//! count with [`AttemptLimiter::release`].
//!
//! Slots are counted in a window that opens at the first reservation.
//! When the last slot fails, the token is locked for the cool-down period
//! and every attempt fails before any key derivation runs. A reservation
//! that is never settled stays counted until the window ends.

pub mod cache;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use aegis_core::config::LimiterConfig;
use aegis_core::error::AppError;
use aegis_core::traits::cache::CacheProvider;

pub use cache::CacheAttemptLimiter;
pub use memory::MemoryAttemptLimiter;

/// Message returned for every refused attempt.
pub const LOCKED_OUT_MESSAGE: &str = "Too many attempts, try again later";

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Still under the threshold.
    Counting {
        /// Attempts used in the current window.
        failures: u32,
        /// Attempts left before lockout.
        remaining: u32,
    },
    /// This failure triggered a lockout.
    LockedOut,
}

/// A reserved attempt slot for one token.
///
/// Hand it back through `record_failure` or `release`.
#[derive(Debug)]
#[must_use = "an attempt permit must be settled with record_failure or release"]
pub struct AttemptPermit {
    token: String,
    attempt: u32,
}

impl AttemptPermit {
    pub(crate) fn new(token: &str, attempt: u32) -> Self {
        Self {
            token: token.to_string(),
            attempt,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Position of this attempt in the current window, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Per-token attempt tracking. Reservation must be atomic with respect to
/// concurrent reservations for the same token.
#[async_trait]
pub trait AttemptLimiter: Send + Sync + std::fmt::Debug {
    /// Reserves one attempt slot. Fails with `RateLimit` while the token is
    /// locked out or every slot in the window is taken.
    async fn try_acquire(&self, token: &str) -> Result<AttemptPermit, AppError>;

    /// Settles a reservation as a failed password attempt.
    async fn record_failure(&self, permit: AttemptPermit) -> Result<AttemptState, AppError>;

    /// Settles a reservation as a success and clears the token's count.
    /// An active lockout is kept.
    async fn release(&self, permit: AttemptPermit) -> Result<(), AppError>;
}

pub(crate) fn locked_out() -> AppError {
    AppError::rate_limited(LOCKED_OUT_MESSAGE)
}

pub(crate) fn state_after(failures: u32, max_failed_attempts: u32) -> AttemptState {
    if failures >= max_failed_attempts {
        AttemptState::LockedOut
    } else {
        AttemptState::Counting {
            failures,
            remaining: max_failed_attempts - failures,
        }
    }
}

/// Build the limiter selected by `config.backend`.
///
/// The `cache` backend shares counters across processes through `cache`.
pub fn build_limiter(
    config: &LimiterConfig,
    cache: Option<Arc<dyn CacheProvider>>,
) -> Result<Arc<dyn AttemptLimiter>, AppError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryAttemptLimiter::new(config))),
        "cache" => {
            let cache = cache.ok_or_else(|| {
                AppError::configuration("limiter.backend = \"cache\" requires a cache provider")
            })?;
            Ok(Arc::new(CacheAttemptLimiter::new(cache, config)))
        }
        other => Err(AppError::configuration(format!(
            "Unknown limiter backend: '{other}'. Supported: memory, cache"
        ))),
    }
}
