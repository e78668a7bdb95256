//! Technical indicator library.
//!
//! Every function is length-preserving: the output series has one entry per
//! input bar, and entries before a window is fully populated are `None`,
//! never zero. [`IndicatorSet`] bundles the default-parameter series that the
//! timing report and signal explanations read.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod fractal;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod sma;

use crate::domain::ohlcv::PriceBar;

use self::bollinger::BollingerSeries;
use self::fractal::FractalFlags;
use self::kdj::KdjSeries;
use self::macd::MacdSeries;

pub const MA_FAST: usize = 20;
pub const MA_SLOW: usize = 60;
pub const MA_LONG: usize = 120;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const KDJ_WINDOW: usize = 9;
pub const BOLL_WINDOW: usize = 20;
pub const BOLL_WIDTH: f64 = 2.0;
pub const ATR_WINDOW: usize = 14;
pub const RSI_WINDOW: usize = 14;
pub const CHANNEL_WINDOW: usize = 20;
pub const CHANNEL_EXIT_WINDOW: usize = 10;
pub const VOLUME_WINDOW: usize = 20;

/// Derived series for one symbol, index-aligned with the source bars.
/// Recomputed fresh per request, never persisted.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub ma_fast: Vec<Option<f64>>,
    pub ma_slow: Vec<Option<f64>>,
    pub ma_long: Vec<Option<f64>>,
    pub macd: MacdSeries,
    pub kdj: KdjSeries,
    pub boll: BollingerSeries,
    pub atr: Vec<Option<f64>>,
    pub atr_pct: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub channel_high: Vec<Option<f64>>,
    pub channel_low: Vec<Option<f64>>,
    pub volume_ma: Vec<Option<f64>>,
    pub fractals: FractalFlags,
}

impl IndicatorSet {
    pub fn compute(bars: &[PriceBar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        IndicatorSet {
            ma_fast: sma::sma(&closes, MA_FAST),
            ma_slow: sma::sma(&closes, MA_SLOW),
            ma_long: sma::sma(&closes, MA_LONG),
            macd: macd::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
            kdj: kdj::kdj(bars, KDJ_WINDOW),
            boll: bollinger::bollinger(&closes, BOLL_WINDOW, BOLL_WIDTH),
            atr: atr::atr(bars, ATR_WINDOW),
            atr_pct: atr::atr_pct(bars, ATR_WINDOW),
            rsi: rsi::rsi(&closes, RSI_WINDOW),
            channel_high: channel::prior_high(bars, CHANNEL_WINDOW),
            channel_low: channel::prior_low(bars, CHANNEL_EXIT_WINDOW),
            volume_ma: sma::sma(&volumes, VOLUME_WINDOW),
            fractals: fractal::fractals(bars),
        }
    }
}
