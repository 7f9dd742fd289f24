use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Invalid birth data field '{field}' (value: '{value}'): {reason}")]
    InvalidBirthData {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid profile field '{field}': {reason}")]
    InvalidProfile { field: String, reason: String },

    #[error("Ephemeris request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Ephemeris lookup timed out after {timeout_ms}ms")]
    EphemerisTimeout { timeout_ms: u64 },

    #[error("Ephemeris response error: {message}")]
    EphemerisResponse { message: String },

    #[error("No precomputed ephemeris entry for {date}")]
    EphemerisTableMiss { date: String },

    #[error("Heuristic chart approximation unavailable: {reason}")]
    HeuristicUnavailable { reason: String },

    #[error("Incomplete chart from {tier}: missing or invalid {missing}")]
    IncompleteChart { tier: String, missing: String },

    #[error("Cache store error: {0}")]
    StoreError(#[from] sled::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Match query failed: {message}")]
    QueryError { message: String },

    #[error("Configuration file not found: {path}")]
    MissingConfigError { path: String },

    #[error("Invalid configuration value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, MatchError>;

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Ephemeris,
    Storage,
    Configuration,
    Internal,
}

/// 錯誤嚴重程度，CLI 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatchError::InvalidBirthData { .. } | MatchError::InvalidProfile { .. } => {
                ErrorCategory::Input
            }
            MatchError::ApiError(_)
            | MatchError::EphemerisTimeout { .. }
            | MatchError::EphemerisResponse { .. }
            | MatchError::EphemerisTableMiss { .. }
            | MatchError::HeuristicUnavailable { .. }
            | MatchError::IncompleteChart { .. } => ErrorCategory::Ephemeris,
            MatchError::StoreError(_)
            | MatchError::IoError(_)
            | MatchError::CsvError(_)
            | MatchError::QueryError { .. } => ErrorCategory::Storage,
            MatchError::MissingConfigError { .. }
            | MatchError::InvalidConfigValueError { .. }
            | MatchError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            MatchError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 星曆錯誤都會由備援層級吸收
            ErrorCategory::Ephemeris => ErrorSeverity::Low,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MatchError::InvalidBirthData { field, .. } => format!(
                "Fix the '{}' field: dates are YYYY-MM-DD, times are 24-hour HH:MM, \
                 latitude is -90..90, longitude is -180..180, timezone is an IANA name",
                field
            ),
            MatchError::InvalidProfile { field, .. } => {
                format!("Check '{}': ratings must be integers from 1 to 10", field)
            }
            MatchError::ApiError(_) | MatchError::EphemerisTimeout { .. } => {
                "Check the ephemeris endpoint or raise ephemeris.timeout_ms".to_string()
            }
            MatchError::EphemerisResponse { .. } | MatchError::IncompleteChart { .. } => {
                "The ephemeris provider returned unusable data; fallback tiers were used"
                    .to_string()
            }
            MatchError::EphemerisTableMiss { .. } | MatchError::HeuristicUnavailable { .. } => {
                "No action needed; a lower chart tier was used".to_string()
            }
            MatchError::StoreError(_) => {
                "Check that cache.path is writable and not opened by another process".to_string()
            }
            MatchError::IoError(_) | MatchError::CsvError(_) => {
                "Check file paths and permissions".to_string()
            }
            MatchError::SerializationError(_) => "Check the JSON input format".to_string(),
            MatchError::QueryError { .. } => "Retry loading the match list".to_string(),
            MatchError::MissingConfigError { path } => {
                format!("Create {} or drop --config to run with defaults", path)
            }
            MatchError::InvalidConfigValueError { .. }
            | MatchError::ConfigValidationError { .. } => {
                "Review the TOML configuration file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input rejected: {}", self),
            ErrorCategory::Ephemeris => format!("Chart lookup degraded: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Internal => format!("Unexpected error: {}", self),
        }
    }

    pub(crate) fn invalid_birth(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        MatchError::InvalidBirthData {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
