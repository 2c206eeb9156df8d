use chrono::Utc;

use super::types::{BybitResponse, BybitTicker};
use super::{collect_quotes, read_body, PriceSource, Watchlist};
use crate::error::FetchError;
use crate::model::quote::PriceQuote;

pub const DEFAULT_BYBIT_URL: &str = "https://api.bybit.com";

/// Public Bybit v5 linear (USDT perpetual) tickers.
pub struct BybitLinearSource {
    http: reqwest::Client,
    base_url: String,
    quote_asset: String,
}

impl BybitLinearSource {
    pub fn new(http: reqwest::Client, base_url: &str, quote_asset: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_asset: quote_asset.to_ascii_uppercase(),
        }
    }

    pub fn ticker_url(&self) -> String {
        format!("{}/v5/market/tickers?category=linear", self.base_url)
    }
}

/// Unwrap the v5 envelope. A non-zero `retCode` fails the whole batch.
pub fn parse_envelope(body: &str) -> Result<Vec<serde_json::Value>, FetchError> {
    let resp: BybitResponse = serde_json::from_str(body)?;
    if resp.ret_code != 0 {
        return Err(FetchError::Api {
            code: resp.ret_code,
            msg: resp.ret_msg,
        });
    }
    Ok(resp.result.map(|r| r.list).unwrap_or_default())
}

impl PriceSource for BybitLinearSource {
    fn name(&self) -> &'static str {
        "bybit-linear"
    }

    async fn fetch(&self, watchlist: Option<&Watchlist>) -> Result<Vec<PriceQuote>, FetchError> {
        let resp = self.http.get(self.ticker_url()).send().await?;
        let body = read_body(resp).await?;
        let observed_at = Utc::now();
        let records = parse_envelope(&body)?;
        Ok(collect_quotes::<BybitTicker>(
            self.name(),
            records,
            watchlist,
            &self.quote_asset,
            observed_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_ret_code_is_api_error() {
        let err = parse_envelope(r#"{"retCode":10001,"retMsg":"params error","result":{}}"#)
            .unwrap_err();
        match err {
            FetchError::Api { code, msg } => {
                assert_eq!(code, 10001);
                assert_eq!(msg, "params error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn envelope_yields_raw_list() {
        let records = parse_envelope(
            r#"{"retCode":0,"retMsg":"OK","result":{"category":"linear","list":[{"symbol":"BTCUSDT","lastPrice":"1"},{"symbol":"ETHUSDT","lastPrice":"2"}]}}"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn envelope_without_result_is_empty() {
        assert!(parse_envelope(r#"{"retCode":0,"retMsg":"OK"}"#).unwrap().is_empty());
    }
}
