/// Candle proxy routes
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    core::constants::DEFAULT_SYMBOL,
    market::types::{Candle, Period},
    webserver::{
        state::AppState,
        utils::{error_response, proxy_error_response, success_response},
    },
};

/// Create candle routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bitget/candles", get(candles))
}

#[derive(Debug, Deserialize)]
struct CandlesQuery {
    symbol: Option<String>,
    period: Option<String>,
    limit: Option<u32>,
}

/// Serialization form of a candle summary
///
/// The variation is held at full precision internally and fixed to eight
/// decimals only here, at the boundary.
#[derive(Debug, Serialize)]
struct CandleResponse {
    symbol: String,
    period: String,
    open: f64,
    close: f64,
    variation: String,
    ts: i64,
}

impl From<&Candle> for CandleResponse {
    fn from(candle: &Candle) -> Self {
        Self {
            symbol: candle.symbol.clone(),
            period: candle.period.clone(),
            open: candle.open,
            close: candle.close,
            variation: format!("{:.8}", candle.variation),
            ts: candle.ts,
        }
    }
}

/// GET /api/bitget/candles?symbol=BTCUSDT_SPBL&period=1h&limit=1
async fn candles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CandlesQuery>,
) -> Response {
    let symbol = params.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let period_token = params.period.unwrap_or_else(|| "1h".to_string());

    let period = match Period::parse(&period_token) {
        Some(period) => period,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                &format!("unknown period '{}'", period_token),
            );
        }
    };
    let limit = params.limit.unwrap_or(1);

    match state.service.candles(&symbol, period, limit).await {
        Ok(candle) => success_response(CandleResponse::from(&candle)),
        Err(e) => proxy_error_response(&e),
    }
}
