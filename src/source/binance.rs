use chrono::Utc;

use super::types::BinanceTickerPrice;
use super::{collect_quotes, read_body, PriceSource, Watchlist};
use crate::error::FetchError;
use crate::model::quote::PriceQuote;

pub const DEFAULT_BINANCE_FUTURES_URL: &str = "https://fapi.binance.com";

/// Public Binance USDT-M futures price ticker. No API key needed.
pub struct BinanceFuturesSource {
    http: reqwest::Client,
    base_url: String,
    quote_asset: String,
}

impl BinanceFuturesSource {
    pub fn new(http: reqwest::Client, base_url: &str, quote_asset: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_asset: quote_asset.to_ascii_uppercase(),
        }
    }

    pub fn ticker_url(&self) -> String {
        format!("{}/fapi/v1/ticker/price", self.base_url)
    }
}

impl PriceSource for BinanceFuturesSource {
    fn name(&self) -> &'static str {
        "binance-futures"
    }

    async fn fetch(&self, watchlist: Option<&Watchlist>) -> Result<Vec<PriceQuote>, FetchError> {
        let resp = self.http.get(self.ticker_url()).send().await?;
        let body = read_body(resp).await?;
        let observed_at = Utc::now();
        let records: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        Ok(collect_quotes::<BinanceTickerPrice>(
            self.name(),
            records,
            watchlist,
            &self.quote_asset,
            observed_at,
        ))
    }
}
