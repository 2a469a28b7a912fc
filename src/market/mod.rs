pub mod spike;
pub mod types;
pub mod variation;

pub use spike::{SpikeAlert, SpikeDetector};
pub use types::{display_symbol, normalize_symbol, normalize_tickers, Candle, Period, Ticker};
pub use variation::variation;
