use crate::config::toml_config::EngineConfig;
use crate::domain::model::{MatchStatus, MatchSummary};
use crate::domain::ports::MatchQuery;
use crate::utils::cache::{match_list_key, match_list_prefix, ResultCache};
use crate::utils::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MATCH_LIST_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 新增了幾筆
    Loaded(usize),
    /// 已有載入進行中，這次呼叫不做任何事
    Skipped,
    /// 沒有更多頁
    Exhausted,
}

#[derive(Debug, Default)]
struct FeedState {
    next_page: u32,
    items: Vec<MatchSummary>,
    exhausted: bool,
}

/// 進行中旗標，離開作用域時自動清除
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 單一使用者的分頁配對清單。同一個 feed 同時只會有一個載入。
pub struct MatchFeed {
    query: Arc<dyn MatchQuery>,
    cache: ResultCache<Vec<MatchSummary>>,
    ttl: Duration,
    user_id: String,
    status: Option<MatchStatus>,
    page_size: u32,
    in_flight: AtomicBool,
    state: Mutex<FeedState>,
}

impl MatchFeed {
    pub fn new(
        query: Arc<dyn MatchQuery>,
        cache: ResultCache<Vec<MatchSummary>>,
        user_id: impl Into<String>,
        status: Option<MatchStatus>,
    ) -> Self {
        Self {
            query,
            cache,
            ttl: DEFAULT_MATCH_LIST_TTL,
            user_id: user_id.into(),
            status,
            page_size: DEFAULT_PAGE_SIZE,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(FeedState::default()),
        }
    }

    /// 頁面快取時間取自 `[cache] match_list_ttl_seconds`
    pub fn from_config(
        config: &EngineConfig,
        query: Arc<dyn MatchQuery>,
        cache: ResultCache<Vec<MatchSummary>>,
        user_id: impl Into<String>,
        status: Option<MatchStatus>,
    ) -> Self {
        Self::new(query, cache, user_id, status).with_ttl(config.match_list_ttl())
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn items(&self) -> Vec<MatchSummary> {
        self.lock_state().items.clone()
    }

    pub fn has_more(&self) -> bool {
        !self.lock_state().exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn page_key(&self, page: u32) -> String {
        let status = self.status.map(|s| s.as_str()).unwrap_or("all");
        match_list_key(&self.user_id, status, page, self.page_size)
    }

    /// 載入下一頁並附加到清單
    pub async fn load_next(&self) -> Result<LoadOutcome> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Load already in flight for {}, skipping", self.user_id);
            return Ok(LoadOutcome::Skipped);
        };
        self.load_page().await
    }

    /// 清除此使用者所有快取頁面並從第一頁重新載入
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Load already in flight for {}, skipping refresh", self.user_id);
            return Ok(LoadOutcome::Skipped);
        };

        let removed = self.cache.invalidate_prefix(&match_list_prefix(&self.user_id));
        tracing::debug!("🔄 Refreshing match feed for {} ({} cached pages dropped)", self.user_id, removed);
        *self.lock_state() = FeedState::default();

        self.load_page().await
    }

    async fn load_page(&self) -> Result<LoadOutcome> {
        let page = {
            let state = self.lock_state();
            if state.exhausted {
                return Ok(LoadOutcome::Exhausted);
            }
            state.next_page
        };

        let key = self.page_key(page);
        let query = Arc::clone(&self.query);
        let user_id = self.user_id.clone();
        let status = self.status;
        let page_size = self.page_size;

        let rows = self
            .cache
            .get_or_fetch(&key, self.ttl, move || {
                let query = Arc::clone(&query);
                let user_id = user_id.clone();
                async move { query.fetch_page(&user_id, status, page, page_size).await }
            })
            .await?;

        let loaded = rows.len();
        let mut state = self.lock_state();
        state.items.extend(rows);
        state.next_page = page + 1;
        state.exhausted = loaded < page_size as usize;

        if loaded == 0 {
            Ok(LoadOutcome::Exhausted)
        } else {
            Ok(LoadOutcome::Loaded(loaded))
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct FixedQuery {
        total: u32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MatchQuery for FixedQuery {
        async fn fetch_page(
            &self,
            user_id: &str,
            status: Option<MatchStatus>,
            page: u32,
            page_size: u32,
        ) -> Result<Vec<MatchSummary>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = page * page_size;
            let end = (start + page_size).min(self.total);
            Ok((start..end)
                .map(|i| MatchSummary {
                    match_id: format!("{}-{}", user_id, i),
                    partner_id: format!("p{}", i),
                    score: 90,
                    status: status.unwrap_or(MatchStatus::Pending),
                })
                .collect())
        }
    }

    fn feed(total: u32) -> (MatchFeed, Arc<FixedQuery>) {
        let query = Arc::new(FixedQuery {
            total,
            calls: AtomicUsize::new(0),
        });
        let feed = MatchFeed::new(query.clone(), ResultCache::in_memory(), "alice", None)
            .with_page_size(2);
        (feed, query)
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let (feed, _) = feed(5);
        assert_eq!(feed.load_next().await.unwrap(), LoadOutcome::Loaded(2));
        assert_eq!(feed.load_next().await.unwrap(), LoadOutcome::Loaded(2));
        assert!(feed.has_more());
        assert_eq!(feed.load_next().await.unwrap(), LoadOutcome::Loaded(1));
        assert!(!feed.has_more());
        assert_eq!(feed.load_next().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(feed.items().len(), 5);
        assert_eq!(feed.items()[4].partner_id, "p4");
    }

    #[test]
    fn test_from_config_uses_match_list_ttl() {
        let config = EngineConfig::from_toml_str("[cache]\nmatch_list_ttl_seconds = 42\n").unwrap();
        let query = Arc::new(FixedQuery {
            total: 0,
            calls: AtomicUsize::new(0),
        });
        let feed = MatchFeed::from_config(&config, query, ResultCache::in_memory(), "alice", None);
        assert_eq!(feed.ttl(), Duration::from_secs(42));

        assert_eq!(self::feed(0).0.ttl(), DEFAULT_MATCH_LIST_TTL);
    }

    #[test]
    fn test_page_key_includes_status_and_size() {
        let (feed, _) = feed(0);
        assert_eq!(feed.page_key(3), "matches:alice:all:3:2");
    }

    #[tokio::test]
    async fn test_skipped_while_in_flight() {
        let (feed, query) = feed(5);
        let guard = InFlight::acquire(&feed.in_flight).unwrap();
        assert!(feed.is_loading());
        assert_eq!(feed.load_next().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(feed.refresh().await.unwrap(), LoadOutcome::Skipped);
        drop(guard);

        assert!(!feed.is_loading());
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
        assert!(feed.items().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_drops_cached_pages() {
        let (feed, query) = feed(3);
        feed.load_next().await.unwrap();
        feed.load_next().await.unwrap();
        assert_eq!(query.calls.load(Ordering::SeqCst), 2);

        assert_eq!(feed.refresh().await.unwrap(), LoadOutcome::Loaded(2));
        assert_eq!(feed.items().len(), 2);
        assert_eq!(query.calls.load(Ordering::SeqCst), 3);
    }
}
