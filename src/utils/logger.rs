//! tracing 初始化：CLI 用精簡格式，服務部署用 JSON

use crate::config::toml_config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` 未設定時使用的過濾條件
pub fn filter_directive(verbose: bool) -> &'static str {
    if verbose {
        "astro_match=debug,info"
    } else {
        "astro_match=info"
    }
}

/// 依 `[logging]` 設定安裝 subscriber；`verbose` 為 CLI 旗標，與設定檔取聯集。
/// 重複呼叫只會保留第一次安裝的 subscriber。
pub fn init_logger(config: &LoggingConfig, verbose: bool) {
    let verbose = verbose || config.verbose;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose)));

    let compact = (!config.json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .compact()
    });
    let json = config.json.then(|| fmt::layer().with_target(true).json());

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .try_init()
    {
        tracing::debug!("Logger already installed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(true), "astro_match=debug,info");
        assert_eq!(filter_directive(false), "astro_match=info");
    }

    #[test]
    fn test_second_init_is_ignored() {
        let config = LoggingConfig {
            verbose: false,
            json: true,
        };
        init_logger(&config, false);
        init_logger(&LoggingConfig::default(), true);
    }
}
