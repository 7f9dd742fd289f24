use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::MatchError;

/// 四元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Water => "Water",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 黃道十二宮，順序從牡羊座開始 (index 0..11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> ZodiacSign {
        Self::ALL[index % 12]
    }

    /// 由黃經 (0..360) 取得星座
    pub fn from_longitude(longitude: f64) -> ZodiacSign {
        let normalized = longitude.rem_euclid(360.0);
        Self::from_index((normalized / 30.0).floor() as usize)
    }

    pub fn element(self) -> Element {
        match self {
            ZodiacSign::Aries | ZodiacSign::Leo | ZodiacSign::Sagittarius => Element::Fire,
            ZodiacSign::Taurus | ZodiacSign::Virgo | ZodiacSign::Capricorn => Element::Earth,
            ZodiacSign::Gemini | ZodiacSign::Libra | ZodiacSign::Aquarius => Element::Air,
            ZodiacSign::Cancer | ZodiacSign::Scorpio | ZodiacSign::Pisces => Element::Water,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ZodiacSign {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|sign| sign.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MatchError::EphemerisResponse {
                message: format!("unknown zodiac sign '{}'", s),
            })
    }
}

/// 參與評分的七顆星體
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
}

impl Planet {
    pub const ALL: [Planet; 7] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mercury,
        Planet::Venus,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
    ];

    /// 相位加權用的星體重要性
    pub fn significance(self) -> f64 {
        match self {
            Planet::Sun | Planet::Moon => 1.0,
            Planet::Venus => 0.9,
            Planet::Mercury | Planet::Mars => 0.8,
            Planet::Jupiter | Planet::Saturn => 0.7,
        }
    }

    pub fn element(self) -> Element {
        match self {
            Planet::Sun | Planet::Mars | Planet::Jupiter => Element::Fire,
            Planet::Venus | Planet::Saturn => Element::Earth,
            Planet::Mercury => Element::Air,
            Planet::Moon => Element::Water,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
        }
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Planet {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|planet| planet.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MatchError::EphemerisResponse {
                message: format!("unknown planet '{}'", s),
            })
    }
}

/// 未驗證的原始出生資料，通常來自資料庫或 JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBirthData {
    pub date: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

/// 已驗證的出生資料。只能經由 `BirthDataValidator` 建立。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBirthData", into = "RawBirthData")]
pub struct BirthData {
    date: NaiveDate,
    time: NaiveTime,
    latitude: f64,
    longitude: f64,
    timezone: Tz,
}

impl BirthData {
    pub(crate) fn from_validated(
        date: NaiveDate,
        time: NaiveTime,
        latitude: f64,
        longitude: f64,
        timezone: Tz,
    ) -> Self {
        Self {
            date,
            time,
            latitude,
            longitude,
            timezone,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// `HH:MM` 格式的出生時間
    pub fn time_string(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// 快取用的指紋：日期 + 時間 + 經緯度
    pub fn fingerprint(&self) -> String {
        format!(
            "{}T{}@{:.4},{:.4}",
            self.date.format("%Y-%m-%d"),
            self.time_string(),
            self.latitude,
            self.longitude
        )
    }
}

impl TryFrom<RawBirthData> for BirthData {
    type Error = MatchError;

    fn try_from(raw: RawBirthData) -> Result<Self, Self::Error> {
        crate::core::validator::BirthDataValidator::validate(&raw)
    }
}

impl From<BirthData> for RawBirthData {
    fn from(birth: BirthData) -> Self {
        RawBirthData {
            date: birth.date.format("%Y-%m-%d").to_string(),
            time: birth.time_string(),
            latitude: birth.latitude,
            longitude: birth.longitude,
            timezone: birth.timezone.name().to_string(),
        }
    }
}

/// 單一星體在星盤中的位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub sign: ZodiacSign,
    /// 星座內度數 [0, 30)
    pub degree: f64,
    /// 宮位 1..=12
    pub house: u8,
}

impl PlanetPosition {
    pub fn from_longitude(longitude: f64, house: u8) -> Self {
        let normalized = longitude.rem_euclid(360.0);
        let sign = ZodiacSign::from_longitude(normalized);
        let degree = (normalized - sign.index() as f64 * 30.0).clamp(0.0, 29.999_999);
        Self {
            sign,
            degree,
            house,
        }
    }

    /// 黃道經度 [0, 360)
    pub fn longitude(&self) -> f64 {
        self.sign.index() as f64 * 30.0 + self.degree
    }
}

pub type PlanetPositions = BTreeMap<Planet, PlanetPosition>;

/// 星盤由哪一層級產生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    External,
    PrecomputedTable,
    Heuristic,
    StaticDefault,
}

impl ChartSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartSource::External => "external",
            ChartSource::PrecomputedTable => "precomputed_table",
            ChartSource::Heuristic => "heuristic",
            ChartSource::StaticDefault => "static_default",
        }
    }
}

impl fmt::Display for ChartSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub birth_data: BirthData,
    pub zodiac_sign: ZodiacSign,
    pub planet_positions: PlanetPositions,
    pub source: ChartSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectType {
    pub fn name(self) -> &'static str {
        match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Opposition => "opposition",
        }
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDetail {
    pub planet1: Planet,
    pub planet2: Planet,
    pub aspect_type: AspectType,
    /// [-1, 1]，正值和諧、負值緊張
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// [0, 1]
    pub score: f64,
    pub weight: f64,
}

/// 問卷資料：三組 1..=10 評分與固定的選擇題答案
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireProfile {
    #[serde(default)]
    pub personality: BTreeMap<String, u8>,
    #[serde(default)]
    pub lifestyle: BTreeMap<String, u8>,
    #[serde(default)]
    pub values: BTreeMap<String, u8>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireScore {
    /// [0, 100]
    pub total: f64,
    pub personality: CategoryScore,
    pub lifestyle: CategoryScore,
    pub values: CategoryScore,
    pub answers: CategoryScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementScore {
    pub sign1: ZodiacSign,
    pub sign2: ZodiacSign,
    pub element1: Element,
    pub element2: Element,
    /// 元素配對基礎分數 (0..100)
    pub base_score: f64,
    /// 雙向平均後的星座修正值 (-20..20)
    pub sign_modifier: f64,
    /// clamp(base + modifier, 0, 100)
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectScore {
    /// 加權平均 [-1, 1]
    pub aggregate: f64,
    /// (aggregate + 1) * 50
    pub normalized: f64,
    /// normalized 與元素分數各半
    pub total: f64,
    pub details: Vec<AspectDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstrologicalScore {
    pub total: f64,
    pub aspect: AspectScore,
    pub element: ElementScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    /// [0, 100]
    pub total: u8,
    pub questionnaire: QuestionnaireScore,
    pub astrological: AstrologicalScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub astrological: String,
    pub aspects: String,
    pub elements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub score: CompatibilityScore,
    pub explanation: Explanation,
}

/// 已驗證的參與者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub birth: BirthData,
    pub profile: QuestionnaireProfile,
}

/// 外部載入、尚未驗證的參與者紀錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: String,
    pub birth: RawBirthData,
    #[serde(default)]
    pub profile: QuestionnaireProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: String,
    pub partner_id: String,
    pub score: u8,
    pub status: MatchStatus,
}

/// 排名輸出的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub candidate_id: String,
    pub total: u8,
    pub questionnaire: f64,
    pub astrological: f64,
    pub element: f64,
    pub aspect: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_elements() {
        assert_eq!(ZodiacSign::Aries.element(), Element::Fire);
        assert_eq!(ZodiacSign::Capricorn.element(), Element::Earth);
        assert_eq!(ZodiacSign::Aquarius.element(), Element::Air);
        assert_eq!(ZodiacSign::Pisces.element(), Element::Water);
        for sign in ZodiacSign::ALL {
            assert_eq!(ZodiacSign::from_index(sign.index()), sign);
        }
    }

    #[test]
    fn test_position_from_longitude() {
        let pos = PlanetPosition::from_longitude(365.5, 3);
        assert_eq!(pos.sign, ZodiacSign::Aries);
        assert!((pos.degree - 5.5).abs() < 1e-9);

        let pos = PlanetPosition::from_longitude(-10.0, 1);
        assert_eq!(pos.sign, ZodiacSign::Pisces);
        assert!((pos.degree - 20.0).abs() < 1e-9);
        assert!((pos.longitude() - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_names_parse_case_insensitive() {
        assert_eq!("  leo ".parse::<ZodiacSign>().unwrap(), ZodiacSign::Leo);
        assert_eq!("VENUS".parse::<Planet>().unwrap(), Planet::Venus);
        assert!("Pluto".parse::<Planet>().is_err());
    }

    #[test]
    fn test_birth_data_serde_revalidates() {
        let bad = serde_json::json!({
            "date": "1990-02-30",
            "time": "12:00",
            "latitude": 10.0,
            "longitude": 10.0,
            "timezone": "UTC"
        });
        assert!(serde_json::from_value::<BirthData>(bad).is_err());
    }
}
