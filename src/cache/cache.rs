//! Typed cache abstraction over Redis

use super::error::{CacheError, CacheResult};
use super::RedisPool;
use async_trait::async_trait;
use bb8::PooledConnection;
use bb8_redis::RedisConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

/// JSON-serialized values under string keys
#[async_trait]
pub trait Cache<T: Serialize + DeserializeOwned + Send + Sync>: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<T>>;

    /// Write only when the key is absent. Returns `false` when it existed.
    async fn set_if_absent(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<bool>;
}

#[derive(Clone)]
pub struct RedisCache {
    pool: RedisPool,
}

impl RedisCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    pub async fn get_connection(
        &self,
    ) -> CacheResult<PooledConnection<'_, RedisConnectionManager>> {
        self.pool.get().await.map_err(CacheError::from)
    }

    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }
}

#[async_trait]
impl<T> Cache<T> for RedisCache
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let mut conn = self.get_connection().await?;
        let raw: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => {
                debug!(key = %key, "cache miss");
                Ok(None)
            }
        }
    }

    async fn set_if_absent(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<bool> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.get_connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(json)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut *conn)
            .await?;
        Ok(reply.is_some())
    }
}
