/// Market service: the cache -> dedup -> upstream composition
///
/// Sole owner of the cache instances, the deduplicators, the spike detector,
/// and the last-refresh timestamp. Endpoint handlers and background tasks
/// all go through this service; nothing else talks to upstream.
use crate::cache::{Deduplicator, TtlCache};
use crate::core::config::ProxyConfig;
use crate::core::constants::{
    CACHE_SWEEP_INTERVAL_SECS, CACHE_SWEEP_STALE_MULTIPLE, MAX_CANDLE_LIMIT,
};
use crate::core::error::{ProxyError, ProxyResult};
use crate::logger::{self, LogTag};
use crate::market::spike::{SpikeAlert, SpikeDetector};
use crate::market::types::{normalize_symbol, normalize_tickers, Candle, Period, Ticker};
use crate::upstream::{MarketDataSource, Product};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Cache keys for whole-batch queries
const KEY_ALL_TICKERS: &str = "all-tickers";
const KEY_PRODUCTS: &str = "products";

/// Cache sizes reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheSizes {
    pub ticker_batches: usize,
    pub single_tickers: usize,
    pub candles: usize,
    pub products: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub caches: CacheSizes,
    pub pending_requests: usize,
    pub alerts: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

pub struct MarketService {
    source: Arc<dyn MarketDataSource>,
    config: ProxyConfig,

    tickers: TtlCache<String, Vec<Ticker>>,
    singles: TtlCache<String, Ticker>,
    candles: TtlCache<String, Candle>,
    products: TtlCache<String, Vec<Product>>,

    tickers_flight: Deduplicator<Vec<Ticker>>,
    singles_flight: Deduplicator<Ticker>,
    candles_flight: Deduplicator<Candle>,
    products_flight: Deduplicator<Vec<Product>>,

    spikes: SpikeDetector,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
}

impl MarketService {
    pub fn new(config: ProxyConfig, source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            tickers: TtlCache::new(Duration::from_secs(config.tickers_ttl_secs)),
            singles: TtlCache::new(Duration::from_secs(config.tickers_ttl_secs)),
            candles: TtlCache::new(Duration::from_secs(config.candles_ttl_secs)),
            products: TtlCache::new(Duration::from_secs(config.products_ttl_secs)),
            tickers_flight: Deduplicator::new(),
            singles_flight: Deduplicator::new(),
            candles_flight: Deduplicator::new(),
            products_flight: Deduplicator::new(),
            spikes: SpikeDetector::new(config.spike_threshold),
            last_refresh: RwLock::new(None),
            config,
        }
    }

    /// Full ticker batch, served from cache within its TTL
    ///
    /// Only the deduplication winner fetches and writes the cache; a fresh
    /// batch is spike-scanned before it is published.
    pub async fn all_tickers(&self) -> ProxyResult<Vec<Ticker>> {
        if let Some(cached) = self.tickers.get(&KEY_ALL_TICKERS.to_string()) {
            return Ok(cached);
        }
        self.tickers_flight
            .run(KEY_ALL_TICKERS, || self.refresh_all_tickers())
            .await
    }

    /// Miss path for the ticker batch: fetch, normalize, scan, cache
    async fn refresh_all_tickers(&self) -> ProxyResult<Vec<Ticker>> {
        let raw = self.source.fetch_all_tickers().await?;
        let tickers = normalize_tickers(&raw);

        self.spikes.scan(&tickers);
        self.tickers.put(KEY_ALL_TICKERS.to_string(), tickers.clone());
        *self.last_refresh.write().unwrap() = Some(Utc::now());

        logger::debug(
            LogTag::Service,
            &format!("refreshed ticker batch ({} symbols)", tickers.len()),
        );
        Ok(tickers)
    }

    /// Single ticker by symbol (normalized)
    ///
    /// Looks in the cached batch first, then the single-ticker cache, then
    /// falls back to a direct upstream fetch unless fallback is disabled.
    pub async fn ticker(&self, symbol: &str) -> ProxyResult<Ticker> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(ProxyError::InvalidRequest(
                "symbol must not be empty".to_string(),
            ));
        }

        if let Some(batch) = self.tickers.get(&KEY_ALL_TICKERS.to_string()) {
            if let Some(ticker) = batch.iter().find(|t| t.symbol == symbol) {
                return Ok(ticker.clone());
            }
        }
        if let Some(cached) = self.singles.get(&symbol) {
            return Ok(cached);
        }

        if !self.config.ticker_fallback_fetch {
            return Err(ProxyError::NotFoundInCache(symbol));
        }

        let key = format!("ticker:{}", symbol);
        self.singles_flight
            .run(&key, || self.fetch_single_ticker(symbol.clone()))
            .await
    }

    async fn fetch_single_ticker(&self, symbol: String) -> ProxyResult<Ticker> {
        let raw = self.source.fetch_ticker(&symbol).await?;
        let ticker = Ticker::from_raw(&raw).ok_or_else(|| {
            ProxyError::UpstreamUnavailable(format!("unusable ticker record for {}", symbol))
        })?;

        self.singles.put(symbol, ticker.clone());
        Ok(ticker)
    }

    /// Candle summary for a symbol and period
    pub async fn candles(&self, symbol: &str, period: Period, limit: u32) -> ProxyResult<Candle> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(ProxyError::InvalidRequest(
                "symbol must not be empty".to_string(),
            ));
        }
        let limit = limit.clamp(1, MAX_CANDLE_LIMIT);

        let key = format!("candles:{}:{}", symbol, period);
        if let Some(cached) = self.candles.get(&key) {
            return Ok(cached);
        }

        self.candles_flight
            .run(&key, || self.fetch_candle_summary(key.clone(), symbol.clone(), period, limit))
            .await
    }

    async fn fetch_candle_summary(
        &self,
        key: String,
        symbol: String,
        period: Period,
        limit: u32,
    ) -> ProxyResult<Candle> {
        let raw = self.source.fetch_candles(&symbol, period, limit).await?;

        // Upstream returns the most recent candle first
        let latest = raw.first().ok_or_else(|| {
            ProxyError::InvalidRequest(format!("no candle data for {}:{}", symbol, period))
        })?;
        let candle = Candle::from_raw(&symbol, period, latest)?;

        self.candles.put(key, candle.clone());
        Ok(candle)
    }

    /// Product listing, passed through from upstream
    pub async fn products(&self) -> ProxyResult<Vec<Product>> {
        if let Some(cached) = self.products.get(&KEY_PRODUCTS.to_string()) {
            return Ok(cached);
        }
        self.products_flight
            .run(KEY_PRODUCTS, || async {
                let products = self.source.fetch_products().await?;
                self.products.put(KEY_PRODUCTS.to_string(), products.clone());
                Ok(products)
            })
            .await
    }

    /// Current spike alerts, newest first
    pub fn alerts(&self) -> Vec<SpikeAlert> {
        self.spikes.alerts()
    }

    /// In-flight upstream calls across all deduplicators
    pub fn pending_requests(&self) -> usize {
        self.tickers_flight.pending_count()
            + self.singles_flight.pending_count()
            + self.candles_flight.pending_count()
            + self.products_flight.pending_count()
    }

    pub fn health(&self) -> ServiceHealth {
        ServiceHealth {
            caches: CacheSizes {
                ticker_batches: self.tickers.len(),
                single_tickers: self.singles.len(),
                candles: self.candles.len(),
                products: self.products.len(),
            },
            pending_requests: self.pending_requests(),
            alerts: self.spikes.len(),
            last_refresh: *self.last_refresh.read().unwrap(),
        }
    }

    /// Drop cache entries that outlived their TTL by a wide margin
    pub fn sweep_caches(&self) -> usize {
        let removed = self.tickers.sweep(CACHE_SWEEP_STALE_MULTIPLE)
            + self.singles.sweep(CACHE_SWEEP_STALE_MULTIPLE)
            + self.candles.sweep(CACHE_SWEEP_STALE_MULTIPLE)
            + self.products.sweep(CACHE_SWEEP_STALE_MULTIPLE);
        if removed > 0 {
            logger::debug(
                LogTag::Cache,
                &format!("sweep removed {} stale cache entries", removed),
            );
        }
        removed
    }

    /// Spawn the background refresh and sweep loops
    ///
    /// The refresh loop re-warms the all-tickers cache through the same
    /// cache/dedup path as client-triggered misses; it never bypasses
    /// deduplication.
    pub fn spawn_background_tasks(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let refresh = {
            let service = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(Duration::from_secs(service.config.refresh_interval_secs));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    if let Err(e) = service.all_tickers().await {
                        logger::warning(
                            LogTag::Service,
                            &format!("background refresh failed: {}", e),
                        );
                    }
                }
            })
        };

        let sweep = {
            let service = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(Duration::from_secs(CACHE_SWEEP_INTERVAL_SECS));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // The first tick fires immediately and has nothing to do
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    service.sweep_caches();
                }
            })
        };

        vec![refresh, sweep]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::types::{RawCandle, RawTicker};
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubSource {
        tickers: Vec<RawTicker>,
        singles: Vec<RawTicker>,
        candles: Vec<RawCandle>,
        ticker_calls: AtomicUsize,
        single_calls: AtomicUsize,
        candle_calls: AtomicUsize,
        fail_tickers: AtomicBool,
        delay_ms: u64,
    }

    impl Default for StubSource {
        fn default() -> Self {
            Self {
                tickers: Vec::new(),
                singles: Vec::new(),
                candles: Vec::new(),
                ticker_calls: AtomicUsize::new(0),
                single_calls: AtomicUsize::new(0),
                candle_calls: AtomicUsize::new(0),
                fail_tickers: AtomicBool::new(false),
                delay_ms: 0,
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn fetch_all_tickers(&self) -> ProxyResult<Vec<RawTicker>> {
            self.ticker_calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_tickers.load(Ordering::SeqCst) {
                return Err(ProxyError::UpstreamUnavailable("stub is down".to_string()));
            }
            Ok(self.tickers.clone())
        }

        async fn fetch_ticker(&self, symbol: &str) -> ProxyResult<RawTicker> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            self.singles
                .iter()
                .find(|t| t.symbol == symbol)
                .cloned()
                .ok_or_else(|| ProxyError::UpstreamRejected {
                    status: 400,
                    body: format!("symbol not found: {}", symbol),
                })
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            _period: Period,
            _limit: u32,
        ) -> ProxyResult<Vec<RawCandle>> {
            self.candle_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candles.clone())
        }

        async fn fetch_products(&self) -> ProxyResult<Vec<Product>> {
            Ok(Vec::new())
        }
    }

    fn raw_ticker(symbol: &str, close: &str, change: &str) -> RawTicker {
        RawTicker {
            symbol: symbol.to_string(),
            close: Some(close.to_string()),
            change: Some(change.to_string()),
            ts: Some("1700000000000".to_string()),
            ..Default::default()
        }
    }

    fn service_with(stub: StubSource) -> (Arc<MarketService>, Arc<StubSource>) {
        let stub = Arc::new(stub);
        let service = Arc::new(MarketService::new(
            ProxyConfig::default(),
            stub.clone() as Arc<dyn MarketDataSource>,
        ));
        (service, stub)
    }

    #[tokio::test]
    async fn test_candles_cached_within_ttl() {
        let (service, stub) = service_with(StubSource {
            candles: vec![RawCandle {
                open: "100".to_string(),
                close: "110".to_string(),
                ts: "1700000000000".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });

        let first = service.candles("btcusdt_spbl ", Period::Hour1, 1).await.unwrap();
        let second = service.candles("BTCUSDT_SPBL", Period::Hour1, 1).await.unwrap();

        // Identical derived candle, one upstream call
        assert_eq!(first, second);
        assert_eq!(first.variation, 10.0);
        assert_eq!(first.ts, 1700000000000);
        assert_eq!(stub.candle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_to_one_fetch() {
        let (service, stub) = service_with(StubSource {
            tickers: vec![raw_ticker("BTCUSDT_SPBL", "50000", "0.01")],
            delay_ms: 30,
            ..Default::default()
        });

        let mut tasks = Vec::new();
        for _ in 0..6 {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move { service.all_tickers().await }));
        }

        for result in join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap().len(), 1);
        }
        assert_eq!(stub.ticker_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_fresh_batch_is_spike_scanned_cached_batch_is_not() {
        let (service, stub) = service_with(StubSource {
            tickers: vec![raw_ticker("BTCUSDT_SPBL", "50000", "0.05")],
            ..Default::default()
        });

        service.all_tickers().await.unwrap();
        assert_eq!(service.alerts().len(), 1);
        assert_eq!(service.alerts()[0].symbol, "BTCUSDT");

        // Served from cache: no new fetch, no duplicate alert
        service.all_tickers().await.unwrap();
        assert_eq!(stub.ticker_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_single_ticker_batch_hit_then_fallback() {
        let (service, stub) = service_with(StubSource {
            tickers: vec![raw_ticker("BTCUSDT_SPBL", "50000", "0.01")],
            singles: vec![raw_ticker("ETHUSDT_SPBL", "3000", "0.02")],
            ..Default::default()
        });

        service.all_tickers().await.unwrap();

        // In the cached batch: no direct fetch
        let btc = service.ticker(" btcusdt_spbl ").await.unwrap();
        assert_eq!(btc.symbol, "BTCUSDT_SPBL");
        assert_eq!(stub.single_calls.load(Ordering::SeqCst), 0);

        // Not in the batch: direct fetch, then served from the singles cache
        let eth = service.ticker("ETHUSDT_SPBL").await.unwrap();
        assert_eq!(eth.price, 3000.0);
        assert_eq!(stub.single_calls.load(Ordering::SeqCst), 1);

        service.ticker("ETHUSDT_SPBL").await.unwrap();
        assert_eq!(stub.single_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_disabled_yields_not_found() {
        let stub = Arc::new(StubSource::default());
        let config = ProxyConfig {
            ticker_fallback_fetch: false,
            ..Default::default()
        };
        let service = MarketService::new(config, stub.clone() as Arc<dyn MarketDataSource>);

        let err = service.ticker("BTCUSDT_SPBL").await.unwrap_err();
        assert_eq!(err, ProxyError::NotFoundInCache("BTCUSDT_SPBL".to_string()));
        assert_eq!(stub.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_cached() {
        let (service, stub) = service_with(StubSource {
            tickers: vec![raw_ticker("BTCUSDT_SPBL", "50000", "0.01")],
            ..Default::default()
        });
        stub.fail_tickers.store(true, Ordering::SeqCst);

        assert!(service.all_tickers().await.is_err());
        assert_eq!(service.health().caches.ticker_batches, 0);
        assert!(service.health().last_refresh.is_none());

        // The slot was released and the next request retries upstream
        stub.fail_tickers.store(false, Ordering::SeqCst);
        assert_eq!(service.all_tickers().await.unwrap().len(), 1);
        assert_eq!(stub.ticker_calls.load(Ordering::SeqCst), 2);
        assert!(service.health().last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_empty_candle_series_is_an_error() {
        let (service, _stub) = service_with(StubSource::default());

        let err = service.candles("BTCUSDT_SPBL", Period::Hour1, 1).await.unwrap_err();
        assert!(matches!(err, ProxyError::InvalidRequest(_)));
        assert_eq!(service.health().caches.candles, 0);
    }

    #[tokio::test]
    async fn test_empty_symbol_is_rejected() {
        let (service, _stub) = service_with(StubSource::default());

        assert!(matches!(
            service.ticker("   ").await.unwrap_err(),
            ProxyError::InvalidRequest(_)
        ));
        assert!(matches!(
            service.candles("", Period::Hour1, 1).await.unwrap_err(),
            ProxyError::InvalidRequest(_)
        ));
    }
}
