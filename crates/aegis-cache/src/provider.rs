//! Selects the cache provider named in configuration.

use std::sync::Arc;

use tracing::info;

use aegis_core::config::CacheConfig;
use aegis_core::error::AppError;
use aegis_core::result::AppResult;
use aegis_core::traits::cache::CacheProvider;

/// Owns the configured cache provider and hands out shared handles to it.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Build the provider named by `config.provider`.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => Arc::new(crate::redis::RedisCacheProvider::connect(&config.redis).await?),
            #[cfg(feature = "memory")]
            "memory" => Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory)),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };
        info!(provider = %config.provider, "Cache provider ready");
        Ok(Self { inner })
    }

    /// Wrap an existing provider.
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// Shared handle to the provider.
    pub fn provider(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.inner)
    }

    pub async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let config = CacheConfig {
            provider: "memcached".to_string(),
            ..Default::default()
        };
        let err = CacheManager::new(&config).await.unwrap_err();
        assert!(err.is(aegis_core::ErrorKind::Configuration));
    }

    #[tokio::test]
    async fn test_memory_provider_dispatch() {
        let manager = CacheManager::new(&CacheConfig::default()).await.unwrap();
        let cache = manager.provider();
        cache.set("k", "v", Duration::from_secs(30)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert!(manager.health_check().await.unwrap());
    }
}
