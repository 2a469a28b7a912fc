/// Shared application state for the webserver
///
/// Holds the market service and shared resources route handlers need.
use crate::core::config::ProxyConfig;
use crate::service::MarketService;
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Proxy configuration
    pub config: Arc<ProxyConfig>,

    /// Cache/dedup/upstream composition behind every endpoint
    pub service: Arc<MarketService>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ProxyConfig, service: Arc<MarketService>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            startup_time: chrono::Utc::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
