use crate::adapters::{HttpEphemerisProvider, SledStore};
use crate::config::toml_config::EngineConfig;
use crate::core::aspects::aspect_score;
use crate::core::composite::combine;
use crate::core::elements::element_compatibility;
use crate::core::ephemeris_table::PrecomputedEphemeris;
use crate::core::natal_chart::{ChartResolver, NatalChartDeriver, DEFAULT_CHART_TTL};
use crate::core::questionnaire::QuestionnaireScorer;
use crate::domain::model::{MatchReport, Participant, RankedMatch};
use crate::domain::ports::{DurableStore, EphemerisProvider};
use crate::utils::cache::{compatibility_key, ResultCache};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;
use std::time::Duration;
use xxhash_rust::xxh64::xxh64;

/// 配對評分入口：星盤推導 + 元素 + 相位 + 問卷 → 綜合分數
pub struct CompatibilityEngine {
    deriver: NatalChartDeriver,
    questionnaire: QuestionnaireScorer,
    reports: ResultCache<MatchReport>,
    report_ttl: Duration,
}

impl CompatibilityEngine {
    pub fn new(
        deriver: NatalChartDeriver,
        questionnaire: QuestionnaireScorer,
        reports: ResultCache<MatchReport>,
        report_ttl: Duration,
    ) -> Self {
        Self {
            deriver,
            questionnaire,
            reports,
            report_ttl,
        }
    }

    /// 只用內建星曆表與記憶體快取
    pub fn offline() -> Self {
        let resolver = ChartResolver::standard(None, PrecomputedEphemeris::bundled());
        Self::new(
            NatalChartDeriver::new(resolver, ResultCache::in_memory(), DEFAULT_CHART_TTL),
            QuestionnaireScorer::default(),
            ResultCache::in_memory(),
            DEFAULT_CHART_TTL,
        )
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let store: Option<Arc<dyn DurableStore>> = match &config.cache.path {
            Some(path) => {
                tracing::info!("💾 Opening result cache at {}", path);
                Some(Arc::new(SledStore::open_path(path)?))
            }
            None => None,
        };
        Self::from_config_with_store(config, store)
    }

    pub fn from_config_with_store(
        config: &EngineConfig,
        store: Option<Arc<dyn DurableStore>>,
    ) -> Result<Self> {
        let table = match &config.ephemeris.table_path {
            Some(path) => {
                tracing::info!("📖 Loading ephemeris table from {}", path);
                Arc::new(PrecomputedEphemeris::from_path(path)?)
            }
            None => PrecomputedEphemeris::bundled(),
        };

        let provider = match &config.ephemeris.endpoint {
            Some(endpoint) => {
                let provider: Arc<dyn EphemerisProvider> = Arc::new(HttpEphemerisProvider::new(
                    endpoint.clone(),
                    config.api_key().map(str::to_string),
                    config.ephemeris_timeout(),
                )?);
                Some((provider, config.ephemeris_timeout()))
            }
            None => None,
        };

        let ratio = config.cache.refresh_ratio;
        let (charts, reports) = match store {
            Some(store) => (
                ResultCache::with_store(Arc::clone(&store)).with_refresh_ratio(ratio),
                ResultCache::with_store(store).with_refresh_ratio(ratio),
            ),
            None => (
                ResultCache::in_memory().with_refresh_ratio(ratio),
                ResultCache::in_memory().with_refresh_ratio(ratio),
            ),
        };

        let resolver = ChartResolver::standard(provider, table);
        tracing::debug!("Chart tiers: {:?}", resolver.tier_sources());

        Ok(Self::new(
            NatalChartDeriver::new(resolver, charts, config.chart_ttl()),
            QuestionnaireScorer::default(),
            reports,
            config.chart_ttl(),
        ))
    }

    /// 純函式評分：同樣輸入永遠得到同樣結果，交換 a/b 分數不變
    pub async fn evaluate(&self, a: &Participant, b: &Participant) -> Result<MatchReport> {
        a.profile.validate()?;
        b.profile.validate()?;

        let chart_a = self.deriver.derive(&a.birth).await;
        let chart_b = self.deriver.derive(&b.birth).await;

        let element = element_compatibility(chart_a.zodiac_sign, chart_b.zodiac_sign);
        let aspect = aspect_score(&chart_a, &chart_b, &element);
        let questionnaire = self.questionnaire.score(&a.profile, &b.profile);

        let report = combine(questionnaire, aspect, element);
        tracing::debug!(
            "Scored {} x {}: total {} (charts: {} / {})",
            a.id,
            b.id,
            report.score.total,
            chart_a.source,
            chart_b.source
        );
        Ok(report)
    }

    /// 以排序後的 id 配對快取報告，key 帶有雙方輸入的內容雜湊
    pub async fn evaluate_cached(&self, a: &Participant, b: &Participant) -> Result<MatchReport> {
        let key = report_key(a, b)?;
        if let Some(report) = self.reports.get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(report);
        }

        let report = self.evaluate(a, b).await?;
        self.reports.set(&key, report.clone(), self.report_ttl);
        Ok(report)
    }

    /// 移除這對參與者所有版本與方向的快取報告
    pub fn forget_pair(&self, a_id: &str, b_id: &str) {
        let prefix = format!("{}:", compatibility_key(a_id, b_id));
        let removed = self.reports.invalidate_prefix(&prefix);
        tracing::debug!("Forgot {} durable report(s) under {}", removed, prefix);
    }

    /// 依總分由高到低排名，同分以 id 排序；略過與自己的配對
    pub async fn rank(&self, subject: &Participant, candidates: &[Participant]) -> Result<Vec<RankedMatch>> {
        let mut ranking = Vec::with_capacity(candidates.len());

        for candidate in candidates.iter().filter(|c| c.id != subject.id) {
            let report = self.evaluate_cached(subject, candidate).await?;
            let score = &report.score;
            ranking.push(RankedMatch {
                candidate_id: candidate.id.clone(),
                total: score.total,
                questionnaire: score.questionnaire.total,
                astrological: score.astrological.total,
                element: score.astrological.element.score,
                aspect: score.astrological.aspect.normalized,
            });
        }

        ranking.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        Ok(ranking)
    }
}

/// `compat:{min}:{max}:{xxh64}`。雜湊依呼叫順序涵蓋雙方 id、出生資料與問卷，
/// 資料變動或交換 a/b 都會得到不同的 key。
pub fn report_key(a: &Participant, b: &Participant) -> Result<String> {
    let content = serde_json::to_vec(&(a, b))?;
    Ok(format!(
        "{}:{:016x}",
        compatibility_key(&a.id, &b.id),
        xxh64(&content, 0)
    ))
}
