use crate::domain::model::{BirthData, Participant, ParticipantRecord, QuestionnaireProfile, RawBirthData};
use crate::utils::error::{MatchError, Result};
use crate::utils::validation::{validate_finite_range, validate_non_empty_string, Validate};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("time pattern is a valid regex")
});

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is a valid regex"));

/// 固定的選擇題題目
pub const CATEGORICAL_QUESTIONS: [&str; 6] = [
    "relationship_goal",
    "wants_children",
    "smoking",
    "drinking",
    "religion",
    "politics",
];

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

/// 出生資料驗證器：不做任何修正或預設值補齊
pub struct BirthDataValidator;

impl BirthDataValidator {
    pub fn validate(raw: &RawBirthData) -> Result<BirthData> {
        let date = Self::parse_date(&raw.date)?;
        let time = Self::parse_time(&raw.time)?;
        validate_finite_range("latitude", raw.latitude, -90.0, 90.0)
            .map_err(|e| Self::as_birth_error("latitude", raw.latitude, e))?;
        validate_finite_range("longitude", raw.longitude, -180.0, 180.0)
            .map_err(|e| Self::as_birth_error("longitude", raw.longitude, e))?;
        let timezone = Self::parse_timezone(&raw.timezone)?;

        Ok(BirthData::from_validated(
            date,
            time,
            raw.latitude,
            raw.longitude,
            timezone,
        ))
    }

    fn parse_date(value: &str) -> Result<NaiveDate> {
        if !DATE_PATTERN.is_match(value) {
            return Err(MatchError::invalid_birth(
                "date",
                value,
                "expected YYYY-MM-DD",
            ));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|e| MatchError::invalid_birth("date", value, format!("not a calendar date: {}", e)))
    }

    fn parse_time(value: &str) -> Result<NaiveTime> {
        let caps = TIME_PATTERN
            .captures(value)
            .ok_or_else(|| MatchError::invalid_birth("time", value, "expected 24-hour HH:MM"))?;

        let hour: u32 = caps[1]
            .parse()
            .map_err(|_| MatchError::invalid_birth("time", value, "invalid hour"))?;
        let minute: u32 = caps[2]
            .parse()
            .map_err(|_| MatchError::invalid_birth("time", value, "invalid minute"))?;

        NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| MatchError::invalid_birth("time", value, "time out of range"))
    }

    fn parse_timezone(value: &str) -> Result<Tz> {
        value
            .parse::<Tz>()
            .map_err(|_| MatchError::invalid_birth("timezone", value, "unknown IANA timezone"))
    }

    fn as_birth_error(field: &str, value: f64, err: MatchError) -> MatchError {
        let reason = match err {
            MatchError::InvalidConfigValueError { reason, .. } => reason,
            other => other.to_string(),
        };
        MatchError::invalid_birth(field, value, reason)
    }
}

impl Validate for RawBirthData {
    fn validate(&self) -> Result<()> {
        BirthDataValidator::validate(self).map(|_| ())
    }
}

impl Validate for QuestionnaireProfile {
    fn validate(&self) -> Result<()> {
        validate_ratings("personality", &self.personality)?;
        validate_ratings("lifestyle", &self.lifestyle)?;
        validate_ratings("values", &self.values)?;

        if let Some(key) = self
            .answers
            .keys()
            .find(|key| !CATEGORICAL_QUESTIONS.contains(&key.as_str()))
        {
            return Err(MatchError::InvalidProfile {
                field: format!("answers.{}", key),
                reason: format!(
                    "unknown question; expected one of: {}",
                    CATEGORICAL_QUESTIONS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

fn validate_ratings(category: &str, ratings: &BTreeMap<String, u8>) -> Result<()> {
    for (key, value) in ratings {
        if !(MIN_RATING..=MAX_RATING).contains(value) {
            return Err(MatchError::InvalidProfile {
                field: format!("{}.{}", category, key),
                reason: format!(
                    "rating {} outside {}..={}",
                    value, MIN_RATING, MAX_RATING
                ),
            });
        }
    }
    Ok(())
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = MatchError;

    fn try_from(record: ParticipantRecord) -> Result<Self> {
        validate_non_empty_string("id", &record.id).map_err(|_| MatchError::InvalidProfile {
            field: "id".to_string(),
            reason: "participant id cannot be empty".to_string(),
        })?;
        let birth = BirthDataValidator::validate(&record.birth)?;
        record.profile.validate()?;

        Ok(Participant {
            id: record.id.trim().to_string(),
            birth,
            profile: record.profile,
        })
    }
}
