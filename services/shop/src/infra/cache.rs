use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::repository::ProductListCache;
use crate::error::ShopError;

pub const PRODUCT_LIST_KEY_PREFIX: &str = "product_list:";

/// Key/value store behind response caching and throttle counters.
///
/// Redis when `CACHE_URL` is configured, otherwise a per-process map.
#[derive(Clone)]
pub enum CacheStore {
    Redis(Pool),
    Memory(Arc<MemoryStore>),
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryStore {
    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))
    }
}

impl CacheStore {
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::default()))
    }

    pub fn redis(url: &str) -> anyhow::Result<Self> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .context("create redis pool")?;
        Ok(Self::Redis(pool))
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match self {
            Self::Redis(pool) => {
                let mut conn = pool.get().await.context("get redis connection")?;
                let value: Option<String> = conn.get(key).await.context("redis GET")?;
                Ok(value)
            }
            Self::Memory(store) => {
                let mut entries = store.lock()?;
                match entries.get(key) {
                    Some(entry) if entry.expires_at > Instant::now() => {
                        Ok(Some(entry.value.clone()))
                    }
                    Some(_) => {
                        entries.remove(key);
                        Ok(None)
                    }
                    None => Ok(None),
                }
            }
        }
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> anyhow::Result<()> {
        match self {
            Self::Redis(pool) => {
                let mut conn = pool.get().await.context("get redis connection")?;
                let (): () = conn
                    .set_ex(key, value, ttl_secs)
                    .await
                    .context("redis SETEX")?;
                Ok(())
            }
            Self::Memory(store) => {
                store.lock()?.insert(
                    key.to_owned(),
                    MemoryEntry {
                        value: value.to_owned(),
                        expires_at: Instant::now() + Duration::from_secs(ttl_secs),
                    },
                );
                Ok(())
            }
        }
    }

    /// Delete every key starting with `prefix`. Returns how many were removed.
    pub async fn delete_prefix(&self, prefix: &str) -> anyhow::Result<usize> {
        match self {
            Self::Redis(pool) => {
                let mut conn = pool.get().await.context("get redis connection")?;
                let keys: Vec<String> = conn
                    .keys(format!("{prefix}*"))
                    .await
                    .context("redis KEYS")?;
                if !keys.is_empty() {
                    let (): () = conn.del(&keys).await.context("redis DEL")?;
                }
                Ok(keys.len())
            }
            Self::Memory(store) => {
                let mut entries = store.lock()?;
                let before = entries.len();
                entries.retain(|k, _| !k.starts_with(prefix));
                Ok(before - entries.len())
            }
        }
    }

    /// Increment a counter, starting its `ttl_secs` expiry on first use.
    pub async fn incr(&self, key: &str, ttl_secs: u64) -> anyhow::Result<u64> {
        match self {
            Self::Redis(pool) => {
                let mut conn = pool.get().await.context("get redis connection")?;
                let count: u64 = conn.incr(key, 1u64).await.context("redis INCR")?;
                if count == 1 {
                    let (): () = conn
                        .expire(key, i64::try_from(ttl_secs).unwrap_or(i64::MAX))
                        .await
                        .context("redis EXPIRE")?;
                }
                Ok(count)
            }
            Self::Memory(store) => {
                let now = Instant::now();
                let mut entries = store.lock()?;
                let entry = entries
                    .entry(key.to_owned())
                    .or_insert_with(|| MemoryEntry {
                        value: "0".to_owned(),
                        expires_at: now + Duration::from_secs(ttl_secs),
                    });
                if entry.expires_at <= now {
                    entry.value = "0".to_owned();
                    entry.expires_at = now + Duration::from_secs(ttl_secs);
                }
                let count = entry.value.parse::<u64>().unwrap_or_default() + 1;
                entry.value = count.to_string();
                Ok(count)
            }
        }
    }
}

/// Bumped by every product write. Not under the page prefix.
pub const PRODUCT_LIST_GENERATION_KEY: &str = "product_list_generation";
const GENERATION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Product-list pages stored under `product_list:<generation>:<raw query>`.
#[derive(Clone)]
pub struct CachedProductList {
    pub store: CacheStore,
    pub ttl_secs: u64,
}

pub fn product_list_key(generation: u64, query: &str) -> String {
    format!("{PRODUCT_LIST_KEY_PREFIX}{generation}:{query}")
}

impl ProductListCache for CachedProductList {
    async fn generation(&self) -> Result<u64, ShopError> {
        let raw = self.store.get(PRODUCT_LIST_GENERATION_KEY).await?;
        Ok(raw.and_then(|v| v.parse().ok()).unwrap_or_default())
    }

    async fn get(&self, generation: u64, query: &str) -> Result<Option<String>, ShopError> {
        Ok(self.store.get(&product_list_key(generation, query)).await?)
    }

    async fn put(&self, generation: u64, query: &str, body: &str) -> Result<(), ShopError> {
        self.store
            .set_ex(&product_list_key(generation, query), body, self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn invalidate(&self) -> Result<(), ShopError> {
        let generation = self
            .store
            .incr(PRODUCT_LIST_GENERATION_KEY, GENERATION_TTL_SECS)
            .await?;
        let removed = self.store.delete_prefix(PRODUCT_LIST_KEY_PREFIX).await?;
        tracing::debug!(generation, removed, "product list cache invalidated");
        Ok(())
    }
}
