//! Composite timing report: a snapshot of the latest bar plus a set of
//! indicator verdicts rolled up into a buy/sell/neutral bias.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::indicator::{self, IndicatorSet};
use crate::domain::ohlcv::PriceBar;

const MAX_REASONS: usize = 12;
const FRACTAL_LOOKBACK: usize = 8;
const PERCENT_B_OVERBOUGHT: f64 = 0.95;
const PERCENT_B_OVERSOLD: f64 = 0.05;

const DISCLAIMERS: [&str; 2] = [
    "For research and education only, not investment advice.",
    "Indicators are computed from historical data and do not predict future prices.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Buy,
    Sell,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub day_change_pct: Option<f64>,
    /// Latest volume over its 20-bar average.
    pub volume_ratio: Option<f64>,
    pub atr_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingReport {
    pub snapshot: TimingSnapshot,
    pub bias: Bias,
    pub bullish_reasons: Vec<String>,
    pub bearish_reasons: Vec<String>,
    pub notes: Vec<String>,
    pub disclaimers: Vec<String>,
}

enum Verdict {
    Bullish(String),
    Bearish(String),
    Note(String),
}

impl TimingReport {
    /// Build the report from the latest bar. `bars` must be non-empty; the
    /// engine enforces the minimum history before calling.
    pub fn build(bars: &[PriceBar], indicators: &IndicatorSet) -> TimingReport {
        let i = bars.len() - 1;
        let last = &bars[i];

        let day_change_pct = (i > 0 && bars[i - 1].close > 0.0)
            .then(|| (last.close / bars[i - 1].close - 1.0) * 100.0);
        let volume_ratio = match indicators.volume_ma[i] {
            Some(avg) if avg > 0.0 => Some(last.volume / avg),
            _ => None,
        };

        let mut bullish = Vec::new();
        let mut bearish = Vec::new();
        let mut notes = Vec::new();
        for verdict in collect_verdicts(bars, indicators, i) {
            match verdict {
                Verdict::Bullish(text) => bullish.push(text),
                Verdict::Bearish(text) => bearish.push(text),
                Verdict::Note(text) => notes.push(text),
            }
        }
        bullish.truncate(MAX_REASONS);
        bearish.truncate(MAX_REASONS);
        notes.truncate(MAX_REASONS);

        let buy = bullish.len() >= 3 && bearish.is_empty();
        let bias = if buy {
            Bias::Buy
        } else if bearish.len() >= 2 {
            Bias::Sell
        } else {
            Bias::Neutral
        };

        TimingReport {
            snapshot: TimingSnapshot {
                date: last.date,
                close: last.close,
                day_change_pct,
                volume_ratio,
                atr_pct: indicators.atr_pct[i],
            },
            bias,
            bullish_reasons: bullish,
            bearish_reasons: bearish,
            notes,
            disclaimers: DISCLAIMERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn collect_verdicts(bars: &[PriceBar], ind: &IndicatorSet, i: usize) -> Vec<Verdict> {
    let mut verdicts = Vec::new();
    let close = bars[i].close;

    // moving-average stack
    if let (Some(fast), Some(slow)) = (ind.ma_fast[i], ind.ma_slow[i]) {
        if close > fast && fast > slow {
            verdicts.push(Verdict::Bullish(format!(
                "price {close:.2} above MA{} {fast:.2} above MA{} {slow:.2}, bullish alignment",
                indicator::MA_FAST,
                indicator::MA_SLOW
            )));
        } else if close < fast && fast < slow {
            verdicts.push(Verdict::Bearish(format!(
                "price {close:.2} below MA{} {fast:.2} below MA{} {slow:.2}, bearish alignment",
                indicator::MA_FAST,
                indicator::MA_SLOW
            )));
        }
    }

    // channel position
    if let Some(high) = ind.channel_high[i] {
        if close > high {
            verdicts.push(Verdict::Bullish(format!(
                "close {close:.2} broke above the prior {}-bar high {high:.2}",
                indicator::CHANNEL_WINDOW
            )));
        }
    }
    if let Some(low) = breakdown_level(bars, i) {
        if close < low {
            verdicts.push(Verdict::Bearish(format!(
                "close {close:.2} broke below the prior {}-bar low {low:.2}",
                indicator::CHANNEL_WINDOW
            )));
        }
    }

    // MACD histogram momentum
    if i > 0 {
        if let (Some(hist), Some(prev)) = (ind.macd.hist[i], ind.macd.hist[i - 1]) {
            if hist > 0.0 && hist > prev {
                verdicts.push(Verdict::Bullish(format!(
                    "MACD histogram {hist:.3} positive and rising"
                )));
            } else if hist < 0.0 && hist < prev {
                verdicts.push(Verdict::Bearish(format!(
                    "MACD histogram {hist:.3} negative and falling"
                )));
            }
        }
    }

    // KDJ momentum
    if i > 0 {
        if let (Some(k), Some(d), Some(k_prev)) = (ind.kdj.k[i], ind.kdj.d[i], ind.kdj.k[i - 1]) {
            if k > d && k > k_prev {
                verdicts.push(Verdict::Bullish(format!(
                    "KDJ K {k:.1} above D {d:.1} and rising"
                )));
            } else if k < d && k < k_prev {
                verdicts.push(Verdict::Bearish(format!(
                    "KDJ K {k:.1} below D {d:.1} and falling"
                )));
            }
        }
    }

    // Bollinger band extremes
    if let Some(pb) = ind.boll.percent_b[i] {
        if pb >= PERCENT_B_OVERBOUGHT {
            verdicts.push(Verdict::Bearish(format!(
                "%b {pb:.2} at the upper band, overbought"
            )));
        } else if pb <= PERCENT_B_OVERSOLD {
            verdicts.push(Verdict::Bullish(format!(
                "%b {pb:.2} at the lower band, oversold"
            )));
        }
    }

    // swing structure from recent fractals
    match swing_trend(bars, ind) {
        SwingTrend::Up => verdicts.push(Verdict::Bullish(
            "recent swing highs and lows are both rising".to_string(),
        )),
        SwingTrend::Down => verdicts.push(Verdict::Bearish(
            "recent swing highs and lows are both falling".to_string(),
        )),
        SwingTrend::Range => verdicts.push(Verdict::Note(
            "recent swing structure is range-bound".to_string(),
        )),
    }

    if let Some(text) = bullish_divergence(bars, ind) {
        verdicts.push(Verdict::Bullish(text));
    }

    verdicts
}

/// Prior 20-bar low for the breakdown check. The shared indicator set keeps
/// the shorter exit-window low, so this one is derived here.
fn breakdown_level(bars: &[PriceBar], i: usize) -> Option<f64> {
    if i < indicator::CHANNEL_WINDOW {
        return None;
    }
    bars[i - indicator::CHANNEL_WINDOW..i]
        .iter()
        .map(|b| b.low)
        .fold(None, |acc: Option<f64>, low| {
            Some(acc.map_or(low, |a| a.min(low)))
        })
}

#[derive(Debug, PartialEq, Eq)]
enum SwingTrend {
    Up,
    Down,
    Range,
}

/// Classify the trend from the last eight swing points. Up needs the last
/// two tops and the last two bottoms each rising; down mirrors it.
fn swing_trend(bars: &[PriceBar], ind: &IndicatorSet) -> SwingTrend {
    let mut swings: Vec<usize> = (0..bars.len())
        .filter(|&i| ind.fractals.tops[i] || ind.fractals.bottoms[i])
        .collect();
    if swings.len() > FRACTAL_LOOKBACK {
        swings.drain(..swings.len() - FRACTAL_LOOKBACK);
    }

    let tops: Vec<usize> = swings
        .iter()
        .copied()
        .filter(|&i| ind.fractals.tops[i])
        .collect();
    let bottoms: Vec<usize> = swings
        .iter()
        .copied()
        .filter(|&i| ind.fractals.bottoms[i])
        .collect();
    if tops.len() < 2 || bottoms.len() < 2 {
        return SwingTrend::Range;
    }

    let (t1, t2) = (tops[tops.len() - 2], tops[tops.len() - 1]);
    let (b1, b2) = (bottoms[bottoms.len() - 2], bottoms[bottoms.len() - 1]);
    let tops_rising = bars[t2].high > bars[t1].high;
    let bottoms_rising = bars[b2].low > bars[b1].low;
    let tops_falling = bars[t2].high < bars[t1].high;
    let bottoms_falling = bars[b2].low < bars[b1].low;

    if tops_rising && bottoms_rising {
        SwingTrend::Up
    } else if tops_falling && bottoms_falling {
        SwingTrend::Down
    } else {
        SwingTrend::Range
    }
}

/// Simplified bullish divergence: price makes a lower swing low while the
/// MACD histogram at that bar is higher than at the previous swing low.
fn bullish_divergence(bars: &[PriceBar], ind: &IndicatorSet) -> Option<String> {
    let bottoms: Vec<usize> = (0..bars.len())
        .filter(|&i| ind.fractals.bottoms[i])
        .collect();
    if bottoms.len() < 2 {
        return None;
    }
    let (b1, b2) = (bottoms[bottoms.len() - 2], bottoms[bottoms.len() - 1]);
    let (h1, h2) = (ind.macd.hist[b1]?, ind.macd.hist[b2]?);
    if bars[b2].low < bars[b1].low && h2 > h1 {
        Some(format!(
            "bullish divergence: price low fell {:.2} -> {:.2} while MACD momentum improved",
            bars[b1].low, bars[b2].low
        ))
    } else {
        None
    }
}
