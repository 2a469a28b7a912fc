/// Ticker proxy routes
use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    core::constants::DEFAULT_SYMBOL,
    logger::{self, LogTag},
    webserver::{
        state::AppState,
        utils::{proxy_error_response, success_response},
    },
};

/// Create ticker routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bitget/all-tickers", get(all_tickers))
        .route("/bitget/ticker", get(single_ticker))
}

#[derive(Debug, Deserialize)]
struct TickerQuery {
    symbol: Option<String>,
}

/// GET /api/bitget/all-tickers
async fn all_tickers(State(state): State<Arc<AppState>>) -> Response {
    match state.service.all_tickers().await {
        Ok(tickers) => success_response(tickers),
        Err(e) => {
            logger::warning(LogTag::Webserver, &format!("all-tickers failed: {}", e));
            proxy_error_response(&e)
        }
    }
}

/// GET /api/bitget/ticker?symbol=BTCUSDT_SPBL
async fn single_ticker(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TickerQuery>,
) -> Response {
    let symbol = params.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!("ticker lookup for '{}'", symbol),
        );
    }

    match state.service.ticker(&symbol).await {
        Ok(ticker) => success_response(ticker),
        Err(e) => proxy_error_response(&e),
    }
}
