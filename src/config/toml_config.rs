use crate::utils::error::{MatchError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_range, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ephemeris: EphemerisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisConfig {
    /// 外部星曆服務；未設定時直接從星曆表開始
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 取代內建星曆表的 CSV
    pub table_path: Option<String>,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
            table_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// sled 目錄；未設定時只有記憶體層
    pub path: Option<String>,
    #[serde(default = "default_chart_ttl_hours")]
    pub chart_ttl_hours: u64,
    #[serde(default = "default_match_list_ttl_seconds")]
    pub match_list_ttl_seconds: u64,
    #[serde(default = "default_refresh_ratio")]
    pub refresh_ratio: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            chart_ttl_hours: default_chart_ttl_hours(),
            match_list_ttl_seconds: default_match_list_ttl_seconds(),
            refresh_ratio: default_refresh_ratio(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub json: bool,
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_chart_ttl_hours() -> u64 {
    24
}

fn default_match_list_ttl_seconds() -> u64 {
    300
}

fn default_refresh_ratio() -> f64 {
    0.25
}

impl EngineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MatchError::MissingConfigError {
                path: path.display().to_string(),
            },
            _ => MatchError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EPHEMERIS_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(endpoint) = &self.ephemeris.endpoint {
            validate_url("ephemeris.endpoint", endpoint)?;
        }
        validate_positive_number("ephemeris.timeout_ms", self.ephemeris.timeout_ms, 1)?;
        if let Some(table_path) = &self.ephemeris.table_path {
            validate_path("ephemeris.table_path", table_path)?;
            validate_file_extension("ephemeris.table_path", table_path, &["csv"])?;
        }

        if let Some(path) = &self.cache.path {
            validate_path("cache.path", path)?;
        }
        validate_positive_number("cache.chart_ttl_hours", self.cache.chart_ttl_hours, 1)?;
        validate_positive_number(
            "cache.match_list_ttl_seconds",
            self.cache.match_list_ttl_seconds,
            1,
        )?;
        validate_range("cache.refresh_ratio", self.cache.refresh_ratio, 0.0, 1.0)?;

        Ok(())
    }

    /// 環境變數未設定時 (仍是 `${...}`) 視為沒有 API key
    pub fn api_key(&self) -> Option<&str> {
        self.ephemeris
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !ENV_VAR_PATTERN.is_match(key))
    }

    pub fn ephemeris_timeout(&self) -> Duration {
        Duration::from_millis(self.ephemeris.timeout_ms)
    }

    pub fn chart_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.chart_ttl_hours * 60 * 60)
    }

    pub fn match_list_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.match_list_ttl_seconds)
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
