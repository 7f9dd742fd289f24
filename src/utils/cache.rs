//! Two-tier TTL cache: an in-process `DashMap` for hot reads backed by an
//! optional [`DurableStore`] so entries survive restarts.
//!
//! Entries carry an absolute expiry (unix ms). `get_or_fetch` serves a still
//! valid value immediately and, once less than `refresh_ratio` of the TTL
//! remains, refreshes it on a background task (stale-while-revalidate).
//! Concurrent writers to one key simply overwrite each other.

use crate::domain::ports::DurableStore;
use crate::utils::error::Result;
use chrono::Utc;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REFRESH_RATIO: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// 絕對到期時間 (unix ms)
    pub expiry: i64,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration, now_ms: i64) -> Self {
        Self {
            data,
            expiry: now_ms.saturating_add(duration_ms(ttl)),
        }
    }

    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expiry
    }

    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expiry - now_ms).max(0)
    }
}

struct CacheInner<T> {
    hot: DashMap<String, CacheEntry<T>>,
    durable: Option<Arc<dyn DurableStore>>,
    refreshing: DashMap<String, ()>,
    refresh_ratio: f64,
}

pub struct ResultCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for ResultCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ResultCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// 只有記憶體層的快取
    pub fn in_memory() -> Self {
        Self::build(None, DEFAULT_REFRESH_RATIO)
    }

    pub fn with_store(store: Arc<dyn DurableStore>) -> Self {
        Self::build(Some(store), DEFAULT_REFRESH_RATIO)
    }

    pub fn with_refresh_ratio(self, refresh_ratio: f64) -> Self {
        Self::build(self.inner.durable.clone(), refresh_ratio)
    }

    fn build(durable: Option<Arc<dyn DurableStore>>, refresh_ratio: f64) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                hot: DashMap::new(),
                durable,
                refreshing: DashMap::new(),
                refresh_ratio: refresh_ratio.clamp(0.0, 1.0),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.lookup_entry(key, now_ms()).map(|entry| entry.data)
    }

    pub fn set(&self, key: &str, value: T, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl, now_ms());

        if let Some(store) = &self.inner.durable {
            match serde_json::to_vec(&entry) {
                Ok(bytes) => {
                    if let Err(e) = store.put(key, &bytes) {
                        tracing::warn!("⚠️ Durable cache write failed for {}: {}", key, e);
                    }
                }
                Err(e) => tracing::warn!("⚠️ Could not serialize cache entry {}: {}", key, e),
            }
        }

        self.inner.hot.insert(key.to_string(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.hot.remove(key);
        self.remove_durable(key);
    }

    /// 移除所有以 `prefix` 開頭的項目，回傳持久層移除數量
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.inner.hot.retain(|key, _| !key.starts_with(prefix));
        match &self.inner.durable {
            Some(store) => store.remove_prefix(prefix).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Durable cache prefix removal failed for {}: {}", prefix, e);
                0
            }),
            None => 0,
        }
    }

    /// 有效值直接回傳；剩餘 TTL 低於門檻時在背景重新取得。
    /// 無有效值時呼叫 `fetch` 並寫入快取。
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let now = now_ms();
        if let Some(entry) = self.lookup_entry(key, now) {
            let threshold = duration_ms(ttl) as f64 * self.inner.refresh_ratio;
            if (entry.remaining_ms(now) as f64) < threshold {
                self.spawn_refresh(key, ttl, fetch);
            }
            return Ok(entry.data);
        }

        tracing::debug!("Cache miss for {}", key);
        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.inner.hot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.hot.is_empty()
    }

    fn lookup_entry(&self, key: &str, now: i64) -> Option<CacheEntry<T>> {
        // 先複製出來，避免持有 DashMap 參照時再移除同一個 key
        let hot = self.inner.hot.get(key).map(|entry| entry.value().clone());
        if let Some(entry) = hot {
            if entry.is_valid_at(now) {
                return Some(entry);
            }
            self.inner.hot.remove(key);
        }

        let store = self.inner.durable.as_ref()?;
        let bytes = match store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("⚠️ Durable cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry<T>>(&bytes) {
            Ok(entry) if entry.is_valid_at(now) => {
                self.inner.hot.insert(key.to_string(), entry.clone());
                Some(entry)
            }
            Ok(_) => {
                tracing::debug!("Expired durable cache entry for {}", key);
                self.remove_durable(key);
                None
            }
            Err(e) => {
                tracing::warn!("⚠️ Corrupt cache entry for {} treated as miss: {}", key, e);
                self.remove_durable(key);
                None
            }
        }
    }

    fn remove_durable(&self, key: &str) {
        if let Some(store) = &self.inner.durable {
            if let Err(e) = store.remove(key) {
                tracing::warn!("⚠️ Durable cache removal failed for {}: {}", key, e);
            }
        }
    }

    fn spawn_refresh<F, Fut>(&self, key: &str, ttl: Duration, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime; skipping background refresh of {}", key);
            return;
        };

        if self.inner.refreshing.insert(key.to_string(), ()).is_some() {
            return;
        }

        tracing::debug!("🔄 Background refresh of {}", key);
        let guard = RefreshGuard {
            cache: self.clone(),
            key: key.to_string(),
        };
        handle.spawn(async move {
            match fetch().await {
                Ok(value) => guard.cache.set(&guard.key, value, ttl),
                Err(e) => tracing::warn!("⚠️ Background refresh of {} failed: {}", guard.key, e),
            }
        });
    }
}

/// 背景更新標記，task 結束或 panic 時都會清除
struct RefreshGuard<T> {
    cache: ResultCache<T>,
    key: String,
}

impl<T> Drop for RefreshGuard<T> {
    fn drop(&mut self) {
        self.cache.inner.refreshing.remove(&self.key);
    }
}

/// 配對分數快取 key：兩個 id 排序後組合，與查詢順序無關
pub fn compatibility_key(id_a: &str, id_b: &str) -> String {
    let (first, second) = if id_a <= id_b { (id_a, id_b) } else { (id_b, id_a) };
    format!("compat:{}:{}", first, second)
}

/// 分頁配對清單快取 key
pub fn match_list_key(user_id: &str, status: &str, page: u32, page_size: u32) -> String {
    format!("{}{}:{}:{}", match_list_prefix(user_id), status, page, page_size)
}

pub fn match_list_prefix(user_id: &str) -> String {
    format!("matches:{}:", user_id)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn duration_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}
