//! Average true range as a rolling mean of the true-range series, and its
//! percentage form ATR% = atr / close * 100.

use super::sma::sma;
use crate::domain::ohlcv::PriceBar;

pub fn atr(bars: &[PriceBar], window: usize) -> Vec<Option<f64>> {
    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    sma(&tr, window)
}

pub fn atr_pct(bars: &[PriceBar], window: usize) -> Vec<Option<f64>> {
    atr(bars, window)
        .into_iter()
        .zip(bars)
        .map(|(value, bar)| {
            let atr = value?;
            if bar.close == 0.0 {
                None
            } else {
                Some(atr / bar.close * 100.0)
            }
        })
        .collect()
}
