use crate::core::chart_tiers::{
    ensure_complete, ExternalEphemerisTier, HeuristicTier, PrecomputedTableTier, StaticDefaultTier,
};
use crate::core::ephemeris_table::PrecomputedEphemeris;
use crate::core::zodiac::sun_sign;
use crate::domain::model::{BirthData, ChartSource, NatalChart};
use crate::domain::ports::{ChartStrategy, EphemerisProvider};
use crate::utils::cache::ResultCache;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CHART_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 依序嘗試各層級；全部失敗時使用靜態預設
pub struct ChartResolver {
    tiers: Vec<Box<dyn ChartStrategy>>,
}

impl ChartResolver {
    pub fn new(tiers: Vec<Box<dyn ChartStrategy>>) -> Self {
        Self { tiers }
    }

    /// 外部服務 (若有) → 星曆表 → 估算 → 靜態預設
    pub fn standard(
        provider: Option<(Arc<dyn EphemerisProvider>, Duration)>,
        table: Arc<PrecomputedEphemeris>,
    ) -> Self {
        let mut tiers: Vec<Box<dyn ChartStrategy>> = Vec::new();
        if let Some((provider, timeout)) = provider {
            tiers.push(Box::new(ExternalEphemerisTier::new(provider, timeout)));
        }
        tiers.push(Box::new(PrecomputedTableTier::new(table)));
        tiers.push(Box::new(HeuristicTier));
        Self::new(tiers)
    }

    pub fn tier_sources(&self) -> Vec<ChartSource> {
        self.tiers.iter().map(|tier| tier.source()).collect()
    }

    pub async fn resolve(&self, birth: &BirthData) -> NatalChart {
        let zodiac_sign = sun_sign(birth.date());

        for tier in &self.tiers {
            let source = tier.source();
            match tier
                .positions(birth)
                .await
                .and_then(|positions| ensure_complete(positions, source))
            {
                Ok(planet_positions) => {
                    tracing::debug!("🪐 Chart for {} resolved by {} tier", birth.fingerprint(), source);
                    return NatalChart {
                        birth_data: birth.clone(),
                        zodiac_sign,
                        planet_positions,
                        source,
                    };
                }
                Err(e) => {
                    tracing::debug!(
                        "Chart tier {} failed for {}: {} ({})",
                        source,
                        birth.fingerprint(),
                        e,
                        e.recovery_suggestion()
                    );
                }
            }
        }

        tracing::warn!(
            "⚠️ All chart tiers failed for {}, using static default",
            birth.fingerprint()
        );
        NatalChart {
            birth_data: birth.clone(),
            zodiac_sign,
            planet_positions: StaticDefaultTier::positions_for(zodiac_sign),
            source: ChartSource::StaticDefault,
        }
    }
}

/// 星盤推導，以出生資料指紋快取
pub struct NatalChartDeriver {
    resolver: Arc<ChartResolver>,
    cache: ResultCache<NatalChart>,
    ttl: Duration,
}

impl NatalChartDeriver {
    pub fn new(resolver: ChartResolver, cache: ResultCache<NatalChart>, ttl: Duration) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache,
            ttl,
        }
    }

    pub fn cache_key(birth: &BirthData) -> String {
        format!("chart:{}", birth.fingerprint())
    }

    /// 永遠回傳完整星盤
    pub async fn derive(&self, birth: &BirthData) -> NatalChart {
        let key = Self::cache_key(birth);
        let resolver = Arc::clone(&self.resolver);
        let owned = birth.clone();

        let cached = self
            .cache
            .get_or_fetch(&key, self.ttl, move || {
                let resolver = Arc::clone(&resolver);
                let birth = owned.clone();
                async move { Ok(resolver.resolve(&birth).await) }
            })
            .await;

        match cached {
            Ok(chart) => chart,
            Err(e) => {
                tracing::warn!("⚠️ Chart cache unavailable for {}: {}", key, e);
                self.resolver.resolve(birth).await
            }
        }
    }

    pub fn invalidate(&self, birth: &BirthData) {
        self.cache.invalidate(&Self::cache_key(birth));
    }
}
