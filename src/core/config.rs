/// Runtime configuration for the proxy
///
/// Defaults come from `core::constants`; environment variables override the
/// defaults and command-line flags override both.
use crate::arguments::{get_arg_value, has_arg};
use crate::core::constants::{
    DEFAULT_CANDLES_TTL_SECS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PRODUCTS_TTL_SECS,
    DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TICKERS_TTL_SECS,
    DEFAULT_UPSTREAM_URL, SPIKE_THRESHOLD,
};
use std::env;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub upstream_base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub tickers_ttl_secs: u64,
    pub candles_ttl_secs: u64,
    pub products_ttl_secs: u64,
    pub refresh_interval_secs: u64,
    pub spike_threshold: f64,

    /// When false, a single-ticker cache miss is an error instead of
    /// falling back to a direct upstream fetch
    pub ticker_fallback_fetch: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upstream_base_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            tickers_ttl_secs: DEFAULT_TICKERS_TTL_SECS,
            candles_ttl_secs: DEFAULT_CANDLES_TTL_SECS,
            products_ttl_secs: DEFAULT_PRODUCTS_TTL_SECS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            spike_threshold: SPIKE_THRESHOLD,
            ticker_fallback_fetch: true,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment and command-line flags
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Ok(url) = env::var("PROXY_UPSTREAM_URL") {
            config.upstream_base_url = url;
        }
        if let Ok(key) = env::var("BITGET_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Some(secs) = env::var("PROXY_TICKERS_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.tickers_ttl_secs = secs;
        }
        if let Some(secs) = env::var("PROXY_CANDLES_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.candles_ttl_secs = secs;
        }
        if let Some(secs) = env::var("PROXY_REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.refresh_interval_secs = secs;
        }

        // Flags win over environment
        if let Some(port) = get_arg_value("--port").and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Some(host) = get_arg_value("--host") {
            config.host = host;
        }
        if has_arg("--no-ticker-fallback") {
            config.ticker_fallback_fetch = false;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upstream_base_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.tickers_ttl_secs, 30);
        assert!(config.ticker_fallback_fetch);
        assert!(config.api_key.is_none());
    }
}
