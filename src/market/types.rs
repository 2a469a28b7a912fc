/// Domain types normalized from upstream wire records
///
/// Raw Bitget records carry every numeric field as a string; this module
/// turns them into the typed values the rest of the proxy works with.
use crate::core::error::{ProxyError, ProxyResult};
use crate::logger::{self, LogTag};
use crate::market::variation::variation;
use crate::upstream::types::{RawCandle, RawTicker};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candle periods accepted by the proxy, in upstream notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour4,
    Hour12,
    Day1,
    Week1,
}

impl Period {
    /// Parse a client-supplied period token
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1min" => Some(Period::Min1),
            "5min" => Some(Period::Min5),
            "15min" => Some(Period::Min15),
            "30min" => Some(Period::Min30),
            "1h" => Some(Period::Hour1),
            "4h" => Some(Period::Hour4),
            "12h" => Some(Period::Hour12),
            "1day" => Some(Period::Day1),
            "1week" => Some(Period::Week1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Min1 => "1min",
            Period::Min5 => "5min",
            Period::Min15 => "15min",
            Period::Min30 => "30min",
            Period::Hour1 => "1h",
            Period::Hour4 => "4h",
            Period::Hour12 => "12h",
            Period::Day1 => "1day",
            Period::Week1 => "1week",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize a client-supplied symbol for cache keys and upstream lookups
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Market-type suffixes Bitget appends to symbols
const MARKET_SUFFIXES: [&str; 4] = ["_SPBL", "_UMCBL", "_DMCBL", "_CMCBL"];

/// Display form of a symbol with the market-type suffix stripped
pub fn display_symbol(symbol: &str) -> String {
    for suffix in MARKET_SUFFIXES {
        if let Some(stripped) = symbol.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    symbol.to_string()
}

/// Normalized ticker snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    /// 24h change as a fraction at rest; scaled to percent only when
    /// formatted for display
    pub change24h: f64,
    pub high24h: f64,
    pub low24h: f64,
    pub volume24h: f64,
    pub ts: i64,
}

impl Ticker {
    /// Normalize one raw upstream record; None when it is unusable
    pub fn from_raw(raw: &RawTicker) -> Option<Self> {
        let price = parse_f64(raw.close.as_deref())?;
        Some(Self {
            symbol: raw.symbol.clone(),
            price,
            change24h: parse_f64(raw.change.as_deref()).unwrap_or(0.0),
            high24h: parse_f64(raw.high24h.as_deref()).unwrap_or(0.0),
            low24h: parse_f64(raw.low24h.as_deref()).unwrap_or(0.0),
            volume24h: parse_f64(raw.base_vol.as_deref()).unwrap_or(0.0),
            ts: parse_i64(raw.ts.as_deref()).unwrap_or(0),
        })
    }
}

/// Normalize a raw batch, skipping unusable records
///
/// One bad record never aborts the batch.
pub fn normalize_tickers(raw: &[RawTicker]) -> Vec<Ticker> {
    let mut tickers = Vec::with_capacity(raw.len());
    for record in raw {
        match Ticker::from_raw(record) {
            Some(ticker) => tickers.push(ticker),
            None => logger::debug(
                LogTag::Service,
                &format!("skipping unparseable ticker record for {}", record.symbol),
            ),
        }
    }
    tickers
}

/// Candle summary derived from the most recent raw candle of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub period: String,
    pub open: f64,
    pub close: f64,
    /// Percent variation between open and close, full precision at rest
    pub variation: f64,
    pub ts: i64,
}

impl Candle {
    pub fn from_raw(symbol: &str, period: Period, raw: &RawCandle) -> ProxyResult<Self> {
        let open = raw
            .open
            .parse::<f64>()
            .map_err(|_| ProxyError::Computation(format!("bad open price '{}'", raw.open)))?;
        let close = raw
            .close
            .parse::<f64>()
            .map_err(|_| ProxyError::Computation(format!("bad close price '{}'", raw.close)))?;
        let variation = variation(open, close)?;

        Ok(Self {
            symbol: symbol.to_string(),
            period: period.as_str().to_string(),
            open,
            close,
            variation,
            ts: raw.ts.parse().unwrap_or(0),
        })
    }
}

fn parse_f64(s: Option<&str>) -> Option<f64> {
    s?.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_i64(s: Option<&str>) -> Option<i64> {
    s?.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" btcusdt_spbl "), "BTCUSDT_SPBL");
        assert_eq!(normalize_symbol("ETHUSDT_SPBL"), "ETHUSDT_SPBL");
    }

    #[test]
    fn test_display_symbol_strips_market_suffix() {
        assert_eq!(display_symbol("BTCUSDT_SPBL"), "BTCUSDT");
        assert_eq!(display_symbol("BTCUSDT_UMCBL"), "BTCUSDT");
        assert_eq!(display_symbol("BTCUSDT"), "BTCUSDT");
    }

    #[test]
    fn test_period_tokens_round_trip() {
        for token in ["1min", "5min", "15min", "30min", "1h", "4h", "12h", "1day", "1week"] {
            assert_eq!(Period::parse(token).unwrap().as_str(), token);
        }
        assert_eq!(Period::parse("3h"), None);
        assert_eq!(Period::parse(""), None);
    }

    #[test]
    fn test_ticker_normalization() {
        let raw = RawTicker {
            symbol: "BTCUSDT_SPBL".to_string(),
            close: Some("50000.5".to_string()),
            change: Some("0.05".to_string()),
            high24h: Some("51000".to_string()),
            low24h: Some("48000".to_string()),
            base_vol: Some("1234.5".to_string()),
            ts: Some("1700000000000".to_string()),
            ..Default::default()
        };

        let ticker = Ticker::from_raw(&raw).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT_SPBL");
        assert_eq!(ticker.price, 50000.5);
        assert_eq!(ticker.change24h, 0.05);
        assert_eq!(ticker.ts, 1700000000000);
    }

    #[test]
    fn test_bad_records_are_skipped_not_fatal() {
        let good = RawTicker {
            symbol: "ETHUSDT_SPBL".to_string(),
            close: Some("3000".to_string()),
            ..Default::default()
        };
        let no_price = RawTicker {
            symbol: "BROKEN_SPBL".to_string(),
            close: None,
            ..Default::default()
        };
        let garbage_price = RawTicker {
            symbol: "NAN_SPBL".to_string(),
            close: Some("not-a-number".to_string()),
            ..Default::default()
        };

        let tickers = normalize_tickers(&[good, no_price, garbage_price]);
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].symbol, "ETHUSDT_SPBL");
    }

    #[test]
    fn test_candle_from_raw() {
        let raw = RawCandle {
            open: "100".to_string(),
            close: "110".to_string(),
            ts: "1700000000000".to_string(),
            ..Default::default()
        };

        let candle = Candle::from_raw("BTCUSDT_SPBL", Period::Hour1, &raw).unwrap();
        assert_eq!(candle.variation, 10.0);
        assert_eq!(candle.period, "1h");
        assert_eq!(candle.ts, 1700000000000);
    }

    #[test]
    fn test_candle_with_zero_open_is_an_error() {
        let raw = RawCandle {
            open: "0".to_string(),
            close: "110".to_string(),
            ts: "1700000000000".to_string(),
            ..Default::default()
        };

        let err = Candle::from_raw("BTCUSDT_SPBL", Period::Hour1, &raw).unwrap_err();
        assert!(matches!(err, ProxyError::Computation(_)));
    }
}
