/// Percentage price variation between two samples
use crate::core::error::{ProxyError, ProxyResult};

/// Percent change from `open` to `close`
///
/// Undefined for `open == 0`; callers get an explicit error instead of a
/// silent NaN/Infinity. The returned value keeps full precision - fixed
/// decimal formatting belongs at the serialization boundary.
pub fn variation(open: f64, close: f64) -> ProxyResult<f64> {
    if open == 0.0 || !open.is_finite() || !close.is_finite() {
        return Err(ProxyError::Computation(format!(
            "variation undefined for open={}, close={}",
            open, close
        )));
    }
    Ok((close - open) / open * 100.0)
}
