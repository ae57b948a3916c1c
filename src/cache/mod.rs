//! Redis-backed cache layer
//!
//! Holds the order metadata written at order creation when `REDIS_URL` is
//! set, so entries survive restarts and are shared between instances.

pub mod cache;
pub mod error;
pub mod keys;

use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::RedisConfig;
pub use error::{CacheError, CacheResult};

pub type RedisPool = Pool<RedisConnectionManager>;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    pub max_connections: u32,
    pub min_idle: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 10,
            min_idle: 1,
            connection_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&RedisConfig> for CacheConfig {
    fn from(config: &RedisConfig) -> Self {
        Self {
            redis_url: config.url.clone(),
            max_connections: config.max_connections.max(1),
            ..Self::default()
        }
    }
}

/// Build the pool. An unreachable Redis at startup is logged, not fatal:
/// the pool reconnects on checkout.
pub async fn init_cache_pool(config: CacheConfig) -> CacheResult<RedisPool> {
    let manager = RedisConnectionManager::new(config.redis_url.as_str())?;
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_idle.min(config.max_connections)))
        .connection_timeout(config.connection_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .build(manager)
        .await?;

    match health_check(&pool).await {
        Ok(()) => info!(max_connections = config.max_connections, "redis pool ready"),
        Err(e) => warn!(error = %e, "redis not reachable yet, continuing"),
    }
    Ok(pool)
}

/// PING through a pooled connection
pub async fn health_check(pool: &RedisPool) -> CacheResult<()> {
    let mut conn = pool.get().await?;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_config_takes_url_and_pool_size_from_settings() {
        let config = CacheConfig::from(&RedisConfig {
            url: "redis://cache:6379/2".to_string(),
            max_connections: 0,
        });
        assert_eq!(config.redis_url, "redis://cache:6379/2");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
    }
}
