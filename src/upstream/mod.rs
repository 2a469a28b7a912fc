/// Upstream gateway for the Bitget spot market API
///
/// Endpoints used:
/// 1. /api/spot/v1/market/tickers - full ticker batch
/// 2. /api/spot/v1/market/ticker?symbol= - single ticker
/// 3. /api/spot/v1/market/candles?symbol=&period=&limit= - candle series
/// 4. /api/spot/v1/public/products - product listing
pub mod types;

pub use types::{BitgetEnvelope, Product, RawCandle, RawTicker, BITGET_OK};

use crate::core::config::ProxyConfig;
use crate::core::constants::UPSTREAM_MIN_INTERVAL_MS;
use crate::core::error::{ProxyError, ProxyResult};
use crate::logger::{self, LogTag};
use crate::market::types::Period;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

const TICKERS_PATH: &str = "/api/spot/v1/market/tickers";
const TICKER_PATH: &str = "/api/spot/v1/market/ticker";
const CANDLES_PATH: &str = "/api/spot/v1/market/candles";
const PRODUCTS_PATH: &str = "/api/spot/v1/public/products";

/// Header carrying the API key when one is configured
const API_KEY_HEADER: &str = "X-API-KEY";

/// The market-data queries the proxy core depends on
///
/// The seam for stubbing upstream in tests: handlers and the service only
/// ever see this trait.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_all_tickers(&self) -> ProxyResult<Vec<RawTicker>>;
    async fn fetch_ticker(&self, symbol: &str) -> ProxyResult<RawTicker>;
    async fn fetch_candles(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> ProxyResult<Vec<RawCandle>>;
    async fn fetch_products(&self) -> ProxyResult<Vec<Product>>;
}

/// Minimum-interval rate limiter
///
/// One request at a time, spaced at least `min_interval` apart.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            last_request: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    /// Wait until a request may be issued
    pub async fn acquire(&self) -> ProxyResult<RateLimitGuard> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ProxyError::UpstreamUnavailable(format!("rate limiter closed: {}", e)))?;

        if !self.min_interval.is_zero() {
            let mut last = self.last_request.lock().await;
            if let Some(prev) = *last {
                let elapsed = prev.elapsed();
                if elapsed < self.min_interval {
                    tokio::time::sleep(self.min_interval - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        Ok(RateLimitGuard { _permit: permit })
    }
}

/// RAII guard returned by [`RateLimiter::acquire`]
pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

/// Bitget API client
pub struct BitgetClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    limiter: RateLimiter,
}

impl BitgetClient {
    pub fn new(config: &ProxyConfig) -> ProxyResult<Self> {
        if config.request_timeout_secs == 0 {
            return Err(ProxyError::InvalidRequest(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                ProxyError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.upstream_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            limiter: RateLimiter::new(Duration::from_millis(UPSTREAM_MIN_INTERVAL_MS)),
        })
    }

    /// Issue a GET and unwrap the Bitget envelope
    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> ProxyResult<T>
    where
        T: DeserializeOwned,
    {
        let _guard = self.limiter.acquire().await?;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }

        logger::debug(LogTag::Upstream, &format!("GET {} {:?}", path, query));
        let start = Instant::now();

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProxyError::UpstreamUnavailable(format!("request timed out: {}", e))
            } else {
                ProxyError::UpstreamUnavailable(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProxyError::UpstreamUnavailable(format!("failed to read response body: {}", e))
        })?;

        logger::verbose(
            LogTag::Upstream,
            &format!(
                "{} -> {} in {}ms ({} bytes)",
                path,
                status,
                start.elapsed().as_millis(),
                body.len()
            ),
        );

        if !status.is_success() {
            logger::warning(
                LogTag::Upstream,
                &format!("upstream rejected {} with {}", path, status),
            );
            return Err(ProxyError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: BitgetEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            ProxyError::UpstreamUnavailable(format!("invalid upstream payload: {}", e))
        })?;

        if envelope.code != BITGET_OK {
            return Err(ProxyError::UpstreamRejected {
                status: status.as_u16(),
                body: format!("{}: {}", envelope.code, envelope.msg),
            });
        }

        envelope.data.ok_or_else(|| ProxyError::UpstreamRejected {
            status: status.as_u16(),
            body: "missing data field".to_string(),
        })
    }
}

#[async_trait]
impl MarketDataSource for BitgetClient {
    async fn fetch_all_tickers(&self) -> ProxyResult<Vec<RawTicker>> {
        self.get_json(TICKERS_PATH, &[]).await
    }

    async fn fetch_ticker(&self, symbol: &str) -> ProxyResult<RawTicker> {
        self.get_json(TICKER_PATH, &[("symbol", symbol.to_string())])
            .await
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        period: Period,
        limit: u32,
    ) -> ProxyResult<Vec<RawCandle>> {
        self.get_json(
            CANDLES_PATH,
            &[
                ("symbol", symbol.to_string()),
                ("period", period.as_str().to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn fetch_products(&self) -> ProxyResult<Vec<Product>> {
        self.get_json(PRODUCTS_PATH, &[]).await
    }
}
