//! MACD: dif = EMA(fast) - EMA(slow), dea = EMA(signal) of dif,
//! hist = dif - dea.

use super::ema::{ema, ema_over_options};

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub dif: Vec<Option<f64>>,
    pub dea: Vec<Option<f64>>,
    pub hist: Vec<Option<f64>>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let dif: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let dea = ema_over_options(&dif, signal);

    let hist: Vec<Option<f64>> = dif
        .iter()
        .zip(&dea)
        .map(|(d, e)| match (d, e) {
            (Some(d), Some(e)) => Some(d - e),
            _ => None,
        })
        .collect();

    MacdSeries { dif, dea, hist }
}
