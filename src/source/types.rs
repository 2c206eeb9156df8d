use serde::Deserialize;

/// Deserialize exchange prices that arrive either as decimal strings or as JSON numbers.
pub fn string_or_number_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

/// A provider ticker record that carries a symbol and a last price.
pub trait TickerRecord {
    fn price(&self) -> f64;
}

/// Binance USDT-M futures ticker (GET /fapi/v1/ticker/price).
#[derive(Debug, Deserialize)]
pub struct BinanceTickerPrice {
    pub symbol: String,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub price: f64,
    #[serde(default)]
    pub time: Option<u64>,
}

impl TickerRecord for BinanceTickerPrice {
    fn price(&self) -> f64 {
        self.price
    }
}

/// Bybit v5 response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitResponse {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Option<BybitTickerList>,
}

#[derive(Debug, Deserialize)]
pub struct BybitTickerList {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<serde_json::Value>,
}

/// Bybit linear ticker (GET /v5/market/tickers?category=linear).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitTicker {
    pub symbol: String,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub last_price: f64,
}

impl TickerRecord for BybitTicker {
    fn price(&self) -> f64 {
        self.last_price
    }
}
