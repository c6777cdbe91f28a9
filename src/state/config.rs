use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SECRET: &str = "default-secret-key";
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bind_address: String,
    /// Key used to sign flash cookies
    pub session_secret: String,
    pub data_dir: PathBuf,
    pub telegram_api_base: String,
    pub telegram_timeout: Duration,
    pub stream_keep_alive: Duration,
    /// Base for generated consent URLs, falls back to the request host when unset
    pub public_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {}", raw))?,
            None => DEFAULT_PORT,
        };

        let telegram_timeout = parse_secs(get("TELEGRAM_TIMEOUT_SECS"), "TELEGRAM_TIMEOUT_SECS", 10)?;
        let stream_keep_alive =
            parse_secs(get("STREAM_KEEP_ALIVE_SECS"), "STREAM_KEEP_ALIVE_SECS", 15)?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            session_secret: get("SESSION_SECRET").unwrap_or_else(|| DEFAULT_SECRET.to_string()),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            telegram_api_base: get("TELEGRAM_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            telegram_timeout,
            stream_keep_alive,
            public_url: get("PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string()),
            cors_allowed_origins,
        })
    }
}

fn parse_secs(raw: Option<String>, key: &str, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{} must be a whole number of seconds", key))?,
        None => default,
    };
    Ok(Duration::from_secs(secs.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.session_secret, "default-secret-key");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.telegram_api_base, "https://api.telegram.org");
        assert_eq!(config.stream_keep_alive, Duration::from_secs(15));
        assert!(config.public_url.is_none());
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn overrides_are_read_and_trimmed() {
        let config = config_from(&[
            ("PORT", "8081"),
            ("SESSION_SECRET", "s3cret"),
            ("PUBLIC_URL", "https://consent.example.com/"),
            ("TELEGRAM_API_BASE", "http://127.0.0.1:9000/"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.session_secret, "s3cret");
        assert_eq!(config.public_url.as_deref(), Some("https://consent.example.com"));
        assert_eq!(config.telegram_api_base, "http://127.0.0.1:9000");
        assert_eq!(config.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
