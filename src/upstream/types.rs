/// Wire types for the Bitget spot v1 market API
///
/// Every numeric field arrives as a string; normalization into typed domain
/// values happens in `market::types`. Unknown fields are ignored.
use serde::{Deserialize, Serialize};

/// Response envelope shared by every Bitget endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BitgetEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

/// API-level success code
pub const BITGET_OK: &str = "00000";

/// Raw ticker record as upstream serves it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicker {
    pub symbol: String,
    #[serde(default)]
    pub close: Option<String>,
    #[serde(default)]
    pub high24h: Option<String>,
    #[serde(default)]
    pub low24h: Option<String>,
    #[serde(default)]
    pub base_vol: Option<String>,
    #[serde(default)]
    pub usdt_vol: Option<String>,
    #[serde(default)]
    pub change: Option<String>,
    #[serde(default)]
    pub change_utc: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

/// Raw candle record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandle {
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub high: Option<String>,
    #[serde(default)]
    pub low: Option<String>,
    #[serde(default)]
    pub base_vol: Option<String>,
    #[serde(default)]
    pub quote_vol: Option<String>,
    pub ts: String,
}

/// Spot product listing record, passed through to clients as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub symbol: String,
    #[serde(default)]
    pub symbol_name: Option<String>,
    #[serde(default)]
    pub base_coin: Option<String>,
    #[serde(default)]
    pub quote_coin: Option<String>,
    #[serde(default)]
    pub min_trade_amount: Option<String>,
    #[serde(default)]
    pub max_trade_amount: Option<String>,
    #[serde(default)]
    pub taker_fee_rate: Option<String>,
    #[serde(default)]
    pub maker_fee_rate: Option<String>,
    #[serde(default)]
    pub price_scale: Option<String>,
    #[serde(default)]
    pub quantity_scale: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parsing() {
        let body = r#"{
            "code": "00000",
            "msg": "success",
            "data": [
                {"symbol": "BTCUSDT_SPBL", "close": "50000", "change": "0.05", "ts": "1700000000000"}
            ]
        }"#;

        let envelope: BitgetEnvelope<Vec<RawTicker>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.code, BITGET_OK);
        let tickers = envelope.data.unwrap();
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].close.as_deref(), Some("50000"));
    }

    #[test]
    fn test_envelope_with_api_error() {
        let body = r#"{"code": "40034", "msg": "Parameter does not exist", "data": null}"#;

        let envelope: BitgetEnvelope<Vec<RawTicker>> = serde_json::from_str(body).unwrap();
        assert_ne!(envelope.code, BITGET_OK);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_candle_camel_case_fields() {
        let body = r#"{"open": "100", "close": "110", "baseVol": "42.5", "ts": "1700000000000"}"#;

        let candle: RawCandle = serde_json::from_str(body).unwrap();
        assert_eq!(candle.open, "100");
        assert_eq!(candle.base_vol.as_deref(), Some("42.5"));
    }
}
