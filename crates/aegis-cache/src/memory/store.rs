//! In-memory cache implementation using the moka crate.
//!
//! Every entry carries its own deadline on the Tokio clock. Reads treat a
//! passed deadline as absent, and moka evicts the entry once the same
//! duration has elapsed on the wall clock.

use std::time::Duration;

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tokio::time::Instant;
use tracing::debug;

use aegis_core::config::cache::MemoryCacheConfig;
use aegis_core::error::AppError;
use aegis_core::result::AppResult;
use aegis_core::traits::cache::CacheProvider;

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    expires_at: Instant,
}

impl CachedValue {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }

    fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.remaining())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining())
    }
}

/// In-memory cache provider using moka.
///
/// Counters are updated through moka's per-key compute, so concurrent
/// increments never lose an update.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, CachedValue>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        Self { cache }
    }

    async fn live(&self, key: &str) -> Option<CachedValue> {
        self.cache.get(key).await.filter(CachedValue::is_live)
    }

    async fn increment(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|existing| {
                let op = match existing.map(|e| e.into_value()).filter(CachedValue::is_live) {
                    Some(current) => match current.value.parse::<i64>() {
                        Ok(n) => Op::Put(CachedValue {
                            value: (n + 1).to_string(),
                            expires_at: current.expires_at,
                        }),
                        Err(_) => Op::Nop,
                    },
                    None => Op::Put(CachedValue::new("1".to_string(), ttl)),
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                let value = entry.into_value().value;
                value
                    .parse::<i64>()
                    .map_err(|_| AppError::cache(format!("Counter '{key}' holds '{value}'")))
            }
            _ => Err(AppError::cache(format!(
                "Value at '{key}' is not an integer"
            ))),
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live(key).await.map(|v| v.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(key.to_string(), CachedValue::new(value.to_string(), ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live(key).await.is_some())
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let value = self.increment(key, ttl).await?;
        debug!(key, value, "Incremented windowed counter");
        Ok(value)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
