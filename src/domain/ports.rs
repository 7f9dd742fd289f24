use crate::domain::model::{
    BirthData, ChartSource, MatchStatus, MatchSummary, PlanetPositions,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// 外部星曆查詢參數
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EphemerisQuery {
    pub date: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl From<&BirthData> for EphemerisQuery {
    fn from(birth: &BirthData) -> Self {
        Self {
            date: birth.date().format("%Y-%m-%d").to_string(),
            time: birth.time_string(),
            latitude: birth.latitude(),
            longitude: birth.longitude(),
            timezone: birth.timezone().name().to_string(),
        }
    }
}

/// 外部星曆服務，視為不可靠
#[async_trait]
pub trait EphemerisProvider: Send + Sync {
    async fn lookup(&self, query: &EphemerisQuery) -> Result<PlanetPositions>;
}

/// 星盤推導的單一層級
#[async_trait]
pub trait ChartStrategy: Send + Sync {
    fn source(&self) -> ChartSource;
    async fn positions(&self, birth: &BirthData) -> Result<PlanetPositions>;
}

/// 快取的持久層 (key-value)
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn remove_prefix(&self, prefix: &str) -> Result<usize>;
}

/// 呼叫端的配對查詢層
#[async_trait]
pub trait MatchQuery: Send + Sync {
    async fn fetch_page(
        &self,
        user_id: &str,
        status: Option<MatchStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<MatchSummary>>;
}
