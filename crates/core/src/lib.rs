pub mod categories;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod view;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    pub const DEFAULT_TICKERS_PATH: &str = "tickers.json";
    pub const DEFAULT_PORT: u16 = 5001;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub tickers_path: PathBuf,
        pub quote_provider_base_url: Option<String>,
        pub quote_provider_cookie_url: Option<String>,
        pub quote_provider_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let port = match std::env::var("PORT") {
                Ok(v) => v
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a port number (got {v:?})"))?,
                Err(_) => DEFAULT_PORT,
            };

            let quote_provider_timeout_secs = match std::env::var("QUOTE_PROVIDER_TIMEOUT_SECS") {
                Ok(v) => Some(v.trim().parse::<u64>().with_context(|| {
                    format!("QUOTE_PROVIDER_TIMEOUT_SECS must be an integer (got {v:?})")
                })?),
                Err(_) => None,
            };

            Ok(Self {
                tickers_path: std::env::var("TICKERS_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TICKERS_PATH)),
                quote_provider_base_url: non_empty_var("QUOTE_PROVIDER_BASE_URL"),
                quote_provider_cookie_url: non_empty_var("QUOTE_PROVIDER_COOKIE_URL"),
                quote_provider_timeout_secs,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                port,
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
