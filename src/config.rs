use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::notify::telegram::DEFAULT_TELEGRAM_API_URL;
use crate::source::binance::DEFAULT_BINANCE_FUTURES_URL;
use crate::source::bybit::DEFAULT_BYBIT_URL;
use crate::source::Watchlist;
use crate::tracker::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Clone)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub source: SourceConfig,
    pub telegram: Option<TelegramConfig>,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub threshold_pct: f64,
    pub poll_secs: u64,
    pub window_secs: u64,
    pub history_capacity: usize,
    pub watchlist: Option<Watchlist>,
    pub startup_message: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Binance,
    Bybit,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" | "binance-futures" => Ok(Self::Binance),
            "bybit" | "bybit-linear" => Ok(Self::Bybit),
            other => bail!("unsupported price source '{}', expected binance or bybit", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub quote_asset: String,
    pub binance_url: String,
    pub bybit_url: String,
    pub http_timeout_secs: u64,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl SourceConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset and blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let threshold_pct: f64 = parse_or(&get, "THRESHOLD_PCT", 5.0)?;
        if !threshold_pct.is_finite() || threshold_pct < 0.0 {
            bail!("THRESHOLD_PCT must be a non-negative number, got {}", threshold_pct);
        }
        let poll_secs: u64 = parse_or(&get, "POLL_SECS", 60)?;
        if poll_secs == 0 {
            bail!("POLL_SECS must be > 0");
        }
        let window_secs: u64 = parse_or(&get, "WINDOW_SECS", 600)?;
        if window_secs == 0 {
            bail!("WINDOW_SECS must be > 0");
        }
        let history_capacity: usize =
            parse_or(&get, "HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?;
        if history_capacity < 2 {
            bail!("HISTORY_CAPACITY must be >= 2, got {}", history_capacity);
        }
        let watchlist = get("WATCHLIST").and_then(|raw| Watchlist::parse(&raw));
        let startup_message = parse_bool_or(&get, "STARTUP_MESSAGE", true)?;

        let kind = match get("PRICE_SOURCE") {
            Some(raw) => raw
                .parse::<SourceKind>()
                .context("PRICE_SOURCE is invalid")?,
            None => SourceKind::Binance,
        };
        let quote_asset = get("QUOTE_ASSET")
            .map(|s| s.to_ascii_uppercase())
            .unwrap_or_else(|| "USDT".to_string());
        let http_timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", 10)?;
        if http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be > 0");
        }

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                bot_token,
                chat_id,
            }),
            (None, None) => None,
            (Some(_), None) => bail!("TELEGRAM_BOT_TOKEN is set but TELEGRAM_CHAT_ID is not"),
            (None, Some(_)) => bail!("TELEGRAM_CHAT_ID is set but TELEGRAM_BOT_TOKEN is not"),
        };

        let port = match get("PORT") {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .with_context(|| format!("invalid PORT '{}'", raw))?,
            ),
            None => None,
        };

        let format = match get("LOG_FORMAT").map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("invalid LOG_FORMAT '{}', expected text or json", other),
        };

        Ok(Self {
            monitor: MonitorConfig {
                threshold_pct,
                poll_secs,
                window_secs,
                history_capacity,
                watchlist,
                startup_message,
            },
            source: SourceConfig {
                kind,
                quote_asset,
                binance_url: get("BINANCE_FUTURES_URL")
                    .unwrap_or_else(|| DEFAULT_BINANCE_FUTURES_URL.to_string()),
                bybit_url: get("BYBIT_URL").unwrap_or_else(|| DEFAULT_BYBIT_URL.to_string()),
                http_timeout_secs,
            },
            telegram,
            health: HealthConfig { port },
            logging: LoggingConfig {
                level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                format,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid {} '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|s| s.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("invalid {} '{}', expected true or false", key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = load(&[]).unwrap();
        assert!((cfg.monitor.threshold_pct - 5.0).abs() < f64::EPSILON);
        assert_eq!(cfg.monitor.poll_secs, 60);
        assert_eq!(cfg.monitor.window_secs, 600);
        assert_eq!(cfg.monitor.history_capacity, 1200);
        assert!(cfg.monitor.watchlist.is_none());
        assert!(cfg.monitor.startup_message);
        assert_eq!(cfg.source.kind, SourceKind::Binance);
        assert_eq!(cfg.source.quote_asset, "USDT");
        assert_eq!(cfg.source.http_timeout_secs, 10);
        assert!(cfg.telegram.is_none());
        assert!(cfg.health.port.is_none());
        assert_eq!(cfg.logging.format, LogFormat::Text);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = load(&[("POLL_SECS", "  "), ("WATCHLIST", "")]).unwrap();
        assert_eq!(cfg.monitor.poll_secs, 60);
        assert!(cfg.monitor.watchlist.is_none());
    }

    #[test]
    fn rejects_zero_durations() {
        assert!(load(&[("POLL_SECS", "0")]).is_err());
        assert!(load(&[("WINDOW_SECS", "0")]).is_err());
        assert!(load(&[("HTTP_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn bool_parsing() {
        assert!(!load(&[("STARTUP_MESSAGE", "false")]).unwrap().monitor.startup_message);
        assert!(load(&[("STARTUP_MESSAGE", "ON")]).unwrap().monitor.startup_message);
        assert!(load(&[("STARTUP_MESSAGE", "maybe")]).is_err());
    }

    #[test]
    fn telegram_debug_redacts_token() {
        let cfg = load(&[("TELEGRAM_BOT_TOKEN", "secret-token"), ("TELEGRAM_CHAT_ID", "7")])
            .unwrap();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
