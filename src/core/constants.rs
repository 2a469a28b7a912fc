/// Default tuning values for the proxy
///
/// Everything here can be overridden through `ProxyConfig`; these are the
/// values used when no environment variable or flag says otherwise.

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Bitget spot API base URL
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.bitget.com";

/// Upstream request timeout in seconds - Bitget is fast, 10s is sufficient
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Minimum spacing between upstream requests (milliseconds)
pub const UPSTREAM_MIN_INTERVAL_MS: u64 = 100;

/// Cache TTLs per entity type (seconds)
///
/// Ticker batches refresh on the upstream's own cadence; candle summaries
/// move faster; the product listing barely changes.
pub const DEFAULT_TICKERS_TTL_SECS: u64 = 30;
pub const DEFAULT_CANDLES_TTL_SECS: u64 = 15;
pub const DEFAULT_PRODUCTS_TTL_SECS: u64 = 60;

/// Background refresh cadence for the all-tickers cache (seconds)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Cache sweep: interval and the TTL multiple beyond which entries are dropped
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 300;
pub const CACHE_SWEEP_STALE_MULTIPLE: u32 = 10;

/// Spike detection
pub const SPIKE_THRESHOLD: f64 = 0.04;
pub const ALERT_LOG_CAP: usize = 50;
pub const ALERT_DUPLICATE_WINDOW_MS: i64 = 300_000;
pub const ALERT_VALUE_EPSILON: f64 = 0.001;

/// Symbol used when a ticker/candle request omits one
pub const DEFAULT_SYMBOL: &str = "BTCUSDT_SPBL";

/// Largest candle series a single request may pull from upstream
pub const MAX_CANDLE_LIMIT: u32 = 100;
