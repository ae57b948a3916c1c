//! Order metadata store
//!
//! Bridges order creation and the follow-up capture call: the settlement
//! amount and rate used when a delayed-capture order was created, keyed by
//! the gateway order id. Entries are written once, never updated, and expire
//! after a TTL. The gateway stays authoritative for amounts.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadataEntry {
    pub settlement_amount: BigDecimal,
    pub settlement_currency: String,
    pub rate: f64,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderMetadataError {
    #[error("Order metadata for {order_id} already exists")]
    AlreadyExists { order_id: String },

    #[error("Order metadata backend error: {0}")]
    Backend(String),
}

pub type OrderMetadataResult<T> = Result<T, OrderMetadataError>;

#[derive(Debug, Clone)]
pub struct OrderMetadataConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for OrderMetadataConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_entries: 10_000,
        }
    }
}

#[async_trait]
pub trait OrderMetadataStore: Send + Sync {
    /// Write the entry for `order_id`. A second write for a live key fails
    /// with `AlreadyExists` and leaves the first entry intact.
    async fn put(&self, order_id: &str, entry: OrderMetadataEntry) -> OrderMetadataResult<()>;

    async fn get(&self, order_id: &str) -> OrderMetadataResult<Option<OrderMetadataEntry>>;

    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> OrderMetadataResult<()> {
        Ok(())
    }
}

struct StoredEntry {
    entry: OrderMetadataEntry,
    expires_at: Instant,
    seq: u64,
}

#[derive(Default)]
struct Entries {
    by_order: HashMap<String, StoredEntry>,
    /// Insertion order; records whose seq no longer matches are stale
    order: VecDeque<(String, u64)>,
    next_seq: u64,
}

impl Entries {
    fn is_current(&self, order_id: &str, seq: u64) -> bool {
        self.by_order
            .get(order_id)
            .map(|s| s.seq == seq)
            .unwrap_or(false)
    }

    /// Drop expired entries from the front. Every entry shares the same TTL,
    /// so insertion order is expiry order.
    fn purge_expired(&mut self, now: Instant) {
        while let Some((order_id, seq)) = self.order.front().cloned() {
            if !self.is_current(&order_id, seq) {
                self.order.pop_front();
                continue;
            }
            let expired = self
                .by_order
                .get(&order_id)
                .map(|s| s.expires_at <= now)
                .unwrap_or(true);
            if !expired {
                break;
            }
            self.by_order.remove(&order_id);
            self.order.pop_front();
        }
    }

    fn evict_oldest(&mut self) {
        while let Some((order_id, seq)) = self.order.pop_front() {
            if self.is_current(&order_id, seq) {
                self.by_order.remove(&order_id);
                debug!(order_id = %order_id, "order metadata evicted at capacity");
                return;
            }
        }
    }
}

/// Bounded, TTL-expiring in-process store
pub struct InMemoryOrderMetadataStore {
    entries: Mutex<Entries>,
    config: OrderMetadataConfig,
}

impl InMemoryOrderMetadataStore {
    pub fn new(config: OrderMetadataConfig) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            config,
        }
    }

    pub async fn len(&self) -> usize {
        let mut entries = self.entries.lock().await;
        entries.purge_expired(Instant::now());
        entries.by_order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryOrderMetadataStore {
    fn default() -> Self {
        Self::new(OrderMetadataConfig::default())
    }
}

#[async_trait]
impl OrderMetadataStore for InMemoryOrderMetadataStore {
    async fn put(&self, order_id: &str, entry: OrderMetadataEntry) -> OrderMetadataResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.purge_expired(now);

        if entries.by_order.contains_key(order_id) {
            return Err(OrderMetadataError::AlreadyExists {
                order_id: order_id.to_string(),
            });
        }
        while entries.by_order.len() >= self.config.max_entries.max(1) {
            entries.evict_oldest();
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.order.push_back((order_id.to_string(), seq));
        entries.by_order.insert(
            order_id.to_string(),
            StoredEntry {
                entry,
                expires_at: now + self.config.ttl,
                seq,
            },
        );
        Ok(())
    }

    async fn get(&self, order_id: &str) -> OrderMetadataResult<Option<OrderMetadataEntry>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let expired = match entries.by_order.get(order_id) {
            Some(stored) if stored.expires_at > now => return Ok(Some(stored.entry.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.by_order.remove(order_id);
        }
        Ok(None)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(feature = "cache")]
pub use redis_store::RedisOrderMetadataStore;

#[cfg(feature = "cache")]
mod redis_store {
    use super::*;
    use crate::cache::cache::{Cache, RedisCache};
    use crate::cache::keys::order_meta::OrderMetaKey;

    /// Redis-backed store: `SET NX EX` enforces write-once and expiry
    pub struct RedisOrderMetadataStore {
        cache: RedisCache,
        ttl: Duration,
    }

    impl RedisOrderMetadataStore {
        pub fn new(cache: RedisCache, ttl: Duration) -> Self {
            Self { cache, ttl }
        }
    }

    #[async_trait]
    impl OrderMetadataStore for RedisOrderMetadataStore {
        async fn put(&self, order_id: &str, entry: OrderMetadataEntry) -> OrderMetadataResult<()> {
            let key = OrderMetaKey::new(order_id).to_string();
            let written = self
                .cache
                .set_if_absent(&key, &entry, self.ttl)
                .await
                .map_err(|e| OrderMetadataError::Backend(e.to_string()))?;
            if !written {
                return Err(OrderMetadataError::AlreadyExists {
                    order_id: order_id.to_string(),
                });
            }
            Ok(())
        }

        async fn get(&self, order_id: &str) -> OrderMetadataResult<Option<OrderMetadataEntry>> {
            let key = OrderMetaKey::new(order_id).to_string();
            self.cache
                .get(&key)
                .await
                .map_err(|e| OrderMetadataError::Backend(e.to_string()))
        }

        fn backend(&self) -> &'static str {
            "redis"
        }

        async fn health_check(&self) -> OrderMetadataResult<()> {
            crate::cache::health_check(self.cache.pool())
                .await
                .map_err(|e| OrderMetadataError::Backend(e.to_string()))
        }
    }
}
