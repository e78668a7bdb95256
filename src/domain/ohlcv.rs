//! Daily OHLCV bar representation and series validation.

use chrono::NaiveDate;

use crate::domain::error::TradesightError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Check the collaborator contract on a supplied series: strictly ascending
/// unique dates, finite fields, high/low bracketing open and close,
/// non-negative volume.
pub fn validate_series(bars: &[PriceBar]) -> Result<(), TradesightError> {
    for (i, bar) in bars.iter().enumerate() {
        let fields = [bar.open, bar.high, bar.low, bar.close, bar.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(TradesightError::DataFetch {
                reason: format!("bar {} has a non-finite field", bar.date),
            });
        }
        if bar.high < bar.open.max(bar.close).max(bar.low) {
            return Err(TradesightError::DataFetch {
                reason: format!("bar {} high {} below body", bar.date, bar.high),
            });
        }
        if bar.low > bar.open.min(bar.close).min(bar.high) {
            return Err(TradesightError::DataFetch {
                reason: format!("bar {} low {} above body", bar.date, bar.low),
            });
        }
        if bar.volume < 0.0 {
            return Err(TradesightError::DataFetch {
                reason: format!("bar {} has negative volume", bar.date),
            });
        }
        if i > 0 && bars[i - 1].date >= bar.date {
            return Err(TradesightError::DataFetch {
                reason: format!(
                    "series not strictly ascending at {} -> {}",
                    bars[i - 1].date,
                    bar.date
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 -> 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 -> 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_accepts_sorted_series() {
        let mut b2 = sample_bar();
        b2.date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        assert!(validate_series(&[sample_bar(), b2]).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_dates() {
        let result = validate_series(&[sample_bar(), sample_bar()]);
        assert!(matches!(result, Err(TradesightError::DataFetch { .. })));
    }

    #[test]
    fn validate_rejects_high_below_close() {
        let mut bar = sample_bar();
        bar.high = 101.0;
        let result = validate_series(&[bar]);
        assert!(matches!(result, Err(TradesightError::DataFetch { .. })));
    }

    #[test]
    fn validate_rejects_nan_volume() {
        let mut bar = sample_bar();
        bar.volume = f64::NAN;
        let result = validate_series(&[bar]);
        assert!(matches!(result, Err(TradesightError::DataFetch { .. })));
    }

    #[test]
    fn validate_rejects_infinite_close() {
        let mut bar = sample_bar();
        bar.close = f64::INFINITY;
        let result = validate_series(&[bar]);
        assert!(matches!(result, Err(TradesightError::DataFetch { .. })));
    }

    #[test]
    fn validate_rejects_negative_volume() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        let result = validate_series(&[bar]);
        assert!(matches!(result, Err(TradesightError::DataFetch { .. })));
    }
}
