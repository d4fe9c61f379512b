//! Per-client request throttle for public share access.
//!
//! Each (client IP, share token) pair gets a fixed-window request counter
//! in the cache. The check runs before the share is looked up, so
//! metadata lookups are throttled as well as password attempts.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use aegis_cache::keys;
use aegis_core::config::ThrottleConfig;
use aegis_core::error::AppError;
use aegis_core::traits::cache::CacheProvider;

/// Message returned when a client is throttled.
pub const THROTTLED_MESSAGE: &str = "Too many requests, try again later";

#[derive(Debug, Clone)]
pub struct RequestThrottle {
    cache: Arc<dyn CacheProvider>,
    max_requests: u32,
    window: Duration,
}

impl RequestThrottle {
    pub fn new(cache: Arc<dyn CacheProvider>, config: &ThrottleConfig) -> Self {
        Self {
            cache,
            max_requests: config.max_requests,
            window: config.window(),
        }
    }

    /// Counts one request from `client` against `token`. Fails with
    /// `RateLimit` once the window's allowance is spent.
    pub async fn check(&self, client: &str, token: &str) -> Result<(), AppError> {
        let count = self
            .cache
            .incr_with_ttl(&keys::access_requests(client, token), self.window)
            .await?;
        if count > i64::from(self.max_requests) {
            warn!(
                client,
                token = %token.get(..8).unwrap_or(token),
                count,
                "Share access throttled"
            );
            return Err(AppError::rate_limited(THROTTLED_MESSAGE));
        }
        Ok(())
    }
}
