pub mod binance;
pub mod bybit;
pub mod types;

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::{FetchError, MalformedRecord};
use crate::model::quote::PriceQuote;

pub use binance::BinanceFuturesSource;
pub use bybit::BybitLinearSource;
use types::TickerRecord;

/// Something that can report the current price of many symbols from one provider.
pub trait PriceSource {
    fn name(&self) -> &'static str;

    /// Fetch one batch of quotes. With a watchlist, only those symbols are returned; otherwise
    /// every symbol quoted in the source's quote asset.
    fn fetch(
        &self,
        watchlist: Option<&Watchlist>,
    ) -> impl Future<Output = Result<Vec<PriceQuote>, FetchError>> + Send;
}

/// Optional allowlist of uppercase symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist(BTreeSet<String>);

impl Watchlist {
    /// Parse a comma-separated list. Returns `None` when no symbol remains after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let set: BTreeSet<String> = raw
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if set.is_empty() {
            None
        } else {
            Some(Self(set))
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Symbol admission rule shared by all providers.
pub fn admits(symbol: &str, watchlist: Option<&Watchlist>, quote_asset: &str) -> bool {
    match watchlist {
        Some(list) => list.contains(symbol),
        None => symbol.ends_with(quote_asset),
    }
}

/// Decode raw ticker records one by one, keeping admitted symbols and skipping malformed records.
pub(crate) fn collect_quotes<T>(
    source: &'static str,
    records: Vec<serde_json::Value>,
    watchlist: Option<&Watchlist>,
    quote_asset: &str,
    observed_at: DateTime<Utc>,
) -> Vec<PriceQuote>
where
    T: TickerRecord + DeserializeOwned,
{
    let mut quotes = Vec::with_capacity(records.len());
    let mut malformed = 0usize;

    for record in records {
        match decode_record::<T>(record, watchlist, quote_asset, observed_at) {
            Ok(Some(quote)) => quotes.push(quote),
            Ok(None) => {}
            Err(e) => {
                malformed += 1;
                tracing::warn!(source, error = %e, "Skipping ticker record");
            }
        }
    }

    if malformed > 0 {
        tracing::debug!(source, malformed, kept = quotes.len(), "Ticker batch had malformed records");
    }
    quotes
}

fn decode_record<T>(
    record: serde_json::Value,
    watchlist: Option<&Watchlist>,
    quote_asset: &str,
    observed_at: DateTime<Utc>,
) -> Result<Option<PriceQuote>, MalformedRecord>
where
    T: TickerRecord + DeserializeOwned,
{
    let symbol = record
        .get("symbol")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MalformedRecord {
            symbol: None,
            reason: "missing symbol".to_string(),
        })?;

    if !admits(&symbol, watchlist, quote_asset) {
        return Ok(None);
    }

    let ticker: T = serde_json::from_value(record).map_err(|e| MalformedRecord {
        symbol: Some(symbol.clone()),
        reason: e.to_string(),
    })?;

    Ok(Some(PriceQuote::new(symbol, ticker.price(), observed_at)))
}

/// Build the shared HTTP client; every request made with it is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("price-mover-watch/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Read a response body, turning non-2xx statuses into `FetchError::Status`.
pub(crate) async fn read_body(resp: reqwest::Response) -> Result<String, FetchError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: truncate(&body, 256),
        });
    }
    Ok(body)
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// The configured provider, chosen at startup.
pub enum AnySource {
    Binance(BinanceFuturesSource),
    Bybit(BybitLinearSource),
}

impl PriceSource for AnySource {
    fn name(&self) -> &'static str {
        match self {
            Self::Binance(s) => s.name(),
            Self::Bybit(s) => s.name(),
        }
    }

    async fn fetch(&self, watchlist: Option<&Watchlist>) -> Result<Vec<PriceQuote>, FetchError> {
        match self {
            Self::Binance(s) => s.fetch(watchlist).await,
            Self::Bybit(s) => s.fetch(watchlist).await,
        }
    }
}
