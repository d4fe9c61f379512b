//! Key-value cache seam shared by the attempt limiter backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// String-valued cache with per-key TTLs.
///
/// Keys passed in are relative; a provider may namespace them.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// `None` when the key is absent or its TTL has passed.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Add one to the counter at `key` and return the new value.
    ///
    /// A counter created by this call expires after `ttl`; later increments
    /// keep the original deadline. Creation and TTL assignment must be a
    /// single atomic step.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    async fn health_check(&self) -> AppResult<bool>;
}
