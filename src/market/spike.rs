/// Spike detection over ticker batches
///
/// Scans ticker snapshots for short-window price spikes and maintains a
/// bounded, deduplicated, newest-first alert log. Repeated scans over a
/// largely-unchanged snapshot append nothing new.
use crate::core::constants::{
    ALERT_DUPLICATE_WINDOW_MS, ALERT_LOG_CAP, ALERT_VALUE_EPSILON, SPIKE_THRESHOLD,
};
use crate::logger::{self, LogTag};
use crate::market::types::{display_symbol, Ticker};
use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded spike; immutable after creation
#[derive(Debug, Clone, Serialize)]
pub struct SpikeAlert {
    /// Display symbol, market-type suffix stripped
    pub symbol: String,
    /// Spike metric as a fraction
    pub spike_value: f64,
    /// Display form, scaled to percent with two decimals
    pub spike_percent: String,
    /// Unix milliseconds at detection time
    pub timestamp: i64,
    pub price: f64,
}

pub struct SpikeDetector {
    threshold: f64,
    alerts: Mutex<VecDeque<SpikeAlert>>,
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self::new(SPIKE_THRESHOLD)
    }
}

impl SpikeDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            alerts: Mutex::new(VecDeque::new()),
        }
    }

    /// Spike metric for one ticker
    ///
    /// The precomputed 24h change fraction wins when present; otherwise the
    /// distance from the 24h low stands in, guarded against a zero low.
    fn spike_metric(ticker: &Ticker) -> f64 {
        if ticker.change24h != 0.0 {
            return ticker.change24h;
        }
        if ticker.low24h > 0.0 {
            return (ticker.price - ticker.low24h) / ticker.low24h;
        }
        0.0
    }

    /// Scan a ticker batch, appending qualifying alerts to the log
    pub fn scan(&self, tickers: &[Ticker]) {
        let now = Utc::now().timestamp_millis();

        // The log mutation is a critical section; concurrent scans must not
        // interleave their appends.
        let mut alerts = self.alerts.lock().unwrap();
        let mut appended = 0;

        for ticker in tickers {
            let metric = Self::spike_metric(ticker);
            if metric < self.threshold {
                continue;
            }

            let symbol = display_symbol(&ticker.symbol);
            let duplicate = alerts.iter().any(|a| {
                a.symbol == symbol
                    && (a.spike_value - metric).abs() < ALERT_VALUE_EPSILON
                    && now - a.timestamp < ALERT_DUPLICATE_WINDOW_MS
            });
            if duplicate {
                continue;
            }

            logger::debug(
                LogTag::Spike,
                &format!("spike on {}: {:.2}%", symbol, metric * 100.0),
            );
            alerts.push_front(SpikeAlert {
                symbol,
                spike_value: metric,
                spike_percent: format!("{:.2}", metric * 100.0),
                timestamp: now,
                price: ticker.price,
            });
            alerts.truncate(ALERT_LOG_CAP);
            appended += 1;
        }

        if appended > 0 {
            logger::info(
                LogTag::Spike,
                &format!("{} spike alert(s) recorded", appended),
            );
        }
    }

    /// Snapshot of the alert log, newest first
    pub fn alerts(&self) -> Vec<SpikeAlert> {
        self.alerts.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
