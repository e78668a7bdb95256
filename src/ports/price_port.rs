//! Daily price history port trait.

use crate::domain::error::TradesightError;
use crate::domain::ohlcv::PriceBar;

pub trait PricePort {
    /// Full daily history for one symbol, sorted ascending by date.
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PriceBar>, TradesightError>;
}
