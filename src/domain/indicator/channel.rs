//! Turtle-style price channel: the extreme of the prior `window` bars,
//! current bar excluded, so a breakout test never compares a bar with itself.

use crate::domain::ohlcv::PriceBar;

/// Highest high over bars [i - window, i). Undefined for i < window.
pub fn prior_high(bars: &[PriceBar], window: usize) -> Vec<Option<f64>> {
    rolling_prior(bars, window, |b| b.high, f64::max, f64::MIN)
}

/// Lowest low over bars [i - window, i). Undefined for i < window.
pub fn prior_low(bars: &[PriceBar], window: usize) -> Vec<Option<f64>> {
    rolling_prior(bars, window, |b| b.low, f64::min, f64::MAX)
}

fn rolling_prior(
    bars: &[PriceBar],
    window: usize,
    field: impl Fn(&PriceBar) -> f64,
    fold: impl Fn(f64, f64) -> f64,
    init: f64,
) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if window == 0 {
        return out;
    }
    for i in window..bars.len() {
        let extreme = bars[i - window..i]
            .iter()
            .map(&field)
            .fold(init, &fold);
        out[i] = Some(extreme);
    }
    out
}
