//! Chart derivation tiers. Each one turns validated birth data into planet
//! positions or fails; `NatalChartDeriver` tries them in order and ends on the
//! unconditional static default.

use crate::core::ephemeris_table::PrecomputedEphemeris;
use crate::core::zodiac::{days_into_sign, sun_sign};
use crate::domain::model::{
    BirthData, ChartSource, Planet, PlanetPosition, PlanetPositions, ZodiacSign,
};
use crate::domain::ports::{ChartStrategy, EphemerisProvider, EphemerisQuery};
use crate::utils::error::{MatchError, Result};
use async_trait::async_trait;
use chrono::{DateTime, LocalResult, TimeZone, Timelike, Utc};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

/// 月亮相對太陽每日約前進 12.19°
pub const MOON_SYNODIC_DEG_PER_DAY: f64 = 12.190_749;
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588;
/// 上升點每 4 分鐘前進 1°
pub const MINUTES_PER_RISING_DEGREE: f64 = 4.0;

const STATIC_DEFAULT_DEGREE: f64 = 15.0;

/// 2000-01-06 18:14 UTC 新月
fn reference_new_moon() -> DateTime<Utc> {
    DateTime::from_timestamp(947_182_440, 0).unwrap_or_default()
}

/// J2000.0 (2000-01-01 12:00 UTC)
fn j2000() -> DateTime<Utc> {
    DateTime::from_timestamp(946_728_000, 0).unwrap_or_default()
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 86_400.0
}

/// 合成上升點：06:00 時與太陽同度，之後每 4 分鐘 1°
pub fn rising_angle(birth: &BirthData, sun_longitude: f64) -> f64 {
    let minutes = birth.time().hour() as f64 * 60.0 + birth.time().minute() as f64;
    (sun_longitude + (minutes - 360.0) / MINUTES_PER_RISING_DEGREE).rem_euclid(360.0)
}

/// 等宮制：從上升點起每 30° 一宮
pub fn house_for(longitude: f64, rising: f64) -> u8 {
    let offset = (longitude - rising).rem_euclid(360.0);
    ((offset / 30.0).floor() as u8 + 1).min(12)
}

fn positions_from_longitudes(longitudes: &[(Planet, f64)], rising: f64) -> PlanetPositions {
    longitudes
        .iter()
        .map(|(planet, lon)| (*planet, PlanetPosition::from_longitude(*lon, house_for(*lon, rising))))
        .collect()
}

/// 拒絕缺少星體或數值越界的結果，不允許半套星盤
pub fn ensure_complete(positions: PlanetPositions, source: ChartSource) -> Result<PlanetPositions> {
    let missing: Vec<&str> = Planet::ALL
        .iter()
        .filter(|planet| match positions.get(planet) {
            Some(pos) => {
                !pos.degree.is_finite()
                    || !(0.0..30.0).contains(&pos.degree)
                    || !(1..=12).contains(&pos.house)
            }
            None => true,
        })
        .map(|planet| planet.name())
        .collect();

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(MatchError::IncompleteChart {
            tier: source.to_string(),
            missing: missing.join(", "),
        })
    }
}

/// 第一層：外部星曆服務，帶逾時
pub struct ExternalEphemerisTier {
    provider: Arc<dyn EphemerisProvider>,
    timeout: Duration,
}

impl ExternalEphemerisTier {
    pub fn new(provider: Arc<dyn EphemerisProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl ChartStrategy for ExternalEphemerisTier {
    fn source(&self) -> ChartSource {
        ChartSource::External
    }

    async fn positions(&self, birth: &BirthData) -> Result<PlanetPositions> {
        let query = EphemerisQuery::from(birth);
        match tokio::time::timeout(self.timeout, self.provider.lookup(&query)).await {
            Ok(result) => result,
            Err(_) => Err(MatchError::EphemerisTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// 第二層：依日期查預先計算的星曆表
pub struct PrecomputedTableTier {
    table: Arc<PrecomputedEphemeris>,
}

impl PrecomputedTableTier {
    pub fn new(table: Arc<PrecomputedEphemeris>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl ChartStrategy for PrecomputedTableTier {
    fn source(&self) -> ChartSource {
        ChartSource::PrecomputedTable
    }

    async fn positions(&self, birth: &BirthData) -> Result<PlanetPositions> {
        let longitudes =
            self.table
                .longitudes(birth.date())
                .ok_or_else(|| MatchError::EphemerisTableMiss {
                    date: birth.date().to_string(),
                })?;

        let sun = longitudes
            .iter()
            .find(|(planet, _)| *planet == Planet::Sun)
            .map(|(_, lon)| *lon)
            .unwrap_or_default();

        Ok(positions_from_longitudes(&longitudes, rising_angle(birth, sun)))
    }
}

/// 第三層：由日期與出生時刻估算
#[derive(Debug, Default)]
pub struct HeuristicTier;

impl HeuristicTier {
    fn birth_instant(birth: &BirthData) -> Result<DateTime<Utc>> {
        let local = birth.date().and_time(birth.time());
        match birth.timezone().from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(MatchError::HeuristicUnavailable {
                reason: format!(
                    "{} does not exist in {} (DST gap)",
                    local,
                    birth.timezone().name()
                ),
            }),
        }
    }

    pub fn estimate_longitudes(birth: &BirthData) -> Result<Vec<(Planet, f64)>> {
        let instant = Self::birth_instant(birth)?;
        let sign = sun_sign(birth.date());

        // 太陽每日約 1°，限制在日期表決定的星座內
        let day_fraction =
            (birth.time().hour() as f64 * 60.0 + birth.time().minute() as f64) / 1440.0;
        let degree = (days_into_sign(birth.date()) as f64 + day_fraction).min(29.9);
        let sun = sign.index() as f64 * 30.0 + degree;

        let lunation = days_between(reference_new_moon(), instant).rem_euclid(SYNODIC_MONTH_DAYS);
        let moon = sun + MOON_SYNODIC_DEG_PER_DAY * lunation;

        let d = days_between(j2000(), instant);
        let mercury = sun + 28.0 * (TAU * d / 115.88).sin();
        let venus = sun + 47.0 * (TAU * d / 583.92).sin();
        let mars = 355.45 + 0.524_03 * d;
        let jupiter = 34.40 + 0.083_09 * d;
        let saturn = 49.94 + 0.033_46 * d;

        Ok(vec![
            (Planet::Sun, sun),
            (Planet::Moon, moon.rem_euclid(360.0)),
            (Planet::Mercury, mercury.rem_euclid(360.0)),
            (Planet::Venus, venus.rem_euclid(360.0)),
            (Planet::Mars, mars.rem_euclid(360.0)),
            (Planet::Jupiter, jupiter.rem_euclid(360.0)),
            (Planet::Saturn, saturn.rem_euclid(360.0)),
        ])
    }
}

#[async_trait]
impl ChartStrategy for HeuristicTier {
    fn source(&self) -> ChartSource {
        ChartSource::Heuristic
    }

    async fn positions(&self, birth: &BirthData) -> Result<PlanetPositions> {
        let longitudes = Self::estimate_longitudes(birth)?;
        let sun = longitudes[0].1;
        Ok(positions_from_longitudes(&longitudes, rising_angle(birth, sun)))
    }
}

/// 最後一層：全部星體放在太陽星座 15 度、第一宮。無條件成功。
#[derive(Debug, Default)]
pub struct StaticDefaultTier;

impl StaticDefaultTier {
    pub fn positions_for(sign: ZodiacSign) -> PlanetPositions {
        Planet::ALL
            .iter()
            .map(|planet| {
                (
                    *planet,
                    PlanetPosition {
                        sign,
                        degree: STATIC_DEFAULT_DEGREE,
                        house: 1,
                    },
                )
            })
            .collect()
    }
}

#[async_trait]
impl ChartStrategy for StaticDefaultTier {
    fn source(&self) -> ChartSource {
        ChartSource::StaticDefault
    }

    async fn positions(&self, birth: &BirthData) -> Result<PlanetPositions> {
        Ok(Self::positions_for(sun_sign(birth.date())))
    }
}
