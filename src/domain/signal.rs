//! Signal template engine: a closed catalogue of five strategies, each a
//! pure function from a price series to boolean entry/exit series.
//!
//! Evaluation semantics:
//! - Cross-above requires index >= 1 and compares both the current and the
//!   previous bar; index 0 is always false.
//! - Any undefined upstream indicator value forces both flags false for that
//!   bar. Templates never raise on indicator math.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::TradesightError;
use crate::domain::indicator::{
    atr, channel, kdj, macd, rsi, sma, ATR_WINDOW, KDJ_WINDOW, MACD_FAST, MACD_SIGNAL, MACD_SLOW,
    VOLUME_WINDOW,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::stats;

/// Fixed strategy catalogue. Not extensible at runtime: dispatch happens
/// through a single match so an unregistered identifier cannot reach the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    TrendFollowing,
    BreakoutVolume,
    MeanReversion,
    EventDriven,
    MultiFactor,
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::TrendFollowing,
        TemplateId::BreakoutVolume,
        TemplateId::MeanReversion,
        TemplateId::EventDriven,
        TemplateId::MultiFactor,
    ];

    pub fn parse(name: &str) -> Result<Self, TradesightError> {
        match name.to_lowercase().as_str() {
            "s1" | "trend_following" => Ok(TemplateId::TrendFollowing),
            "s2" | "breakout_volume" => Ok(TemplateId::BreakoutVolume),
            "s3" | "mean_reversion" => Ok(TemplateId::MeanReversion),
            "s4" | "event_driven" => Ok(TemplateId::EventDriven),
            "s5" | "multi_factor" => Ok(TemplateId::MultiFactor),
            _ => Err(TradesightError::UnsupportedTemplate {
                name: name.to_string(),
            }),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TemplateId::TrendFollowing => "s1",
            TemplateId::BreakoutVolume => "s2",
            TemplateId::MeanReversion => "s3",
            TemplateId::EventDriven => "s4",
            TemplateId::MultiFactor => "s5",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemplateId::TrendFollowing => "trend following",
            TemplateId::BreakoutVolume => "breakout with volume",
            TemplateId::MeanReversion => "mean reversion",
            TemplateId::EventDriven => "event driven",
            TemplateId::MultiFactor => "multi-factor confirmation",
        }
    }
}

/// Tunable parameters shared across the catalogue. Each template reads only
/// the fields it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub breakout_lookback: usize,
    pub volume_window: usize,
    pub volume_quantile: f64,
    pub exit_ma_window: usize,
    pub rsi_window: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
    pub hold_days: usize,
    pub channel_window: usize,
    pub exit_low_window: usize,
    pub volume_ratio_min: f64,
    pub atr_pct_max: f64,
}

impl Default for TemplateParams {
    fn default() -> Self {
        TemplateParams {
            fast_window: 20,
            slow_window: 60,
            breakout_lookback: 20,
            volume_window: 20,
            volume_quantile: 0.8,
            exit_ma_window: 10,
            rsi_window: 14,
            rsi_entry: 30.0,
            rsi_exit: 50.0,
            hold_days: 5,
            channel_window: 20,
            exit_low_window: 10,
            volume_ratio_min: 1.5,
            atr_pct_max: 6.0,
        }
    }
}

impl TemplateParams {
    /// Build from string key/value pairs (CLI flags, INI section). Unknown
    /// keys and unparsable numbers are caller errors.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, TradesightError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = TemplateParams::default();
        for (key, value) in pairs {
            params.set(key, value)?;
        }
        Ok(params)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), TradesightError> {
        fn usize_of(key: &str, value: &str) -> Result<usize, TradesightError> {
            value
                .trim()
                .parse()
                .map_err(|_| TradesightError::InvalidParameters {
                    key: key.to_string(),
                    reason: format!("'{value}' is not a positive integer"),
                })
        }
        fn f64_of(key: &str, value: &str) -> Result<f64, TradesightError> {
            value
                .trim()
                .parse()
                .map_err(|_| TradesightError::InvalidParameters {
                    key: key.to_string(),
                    reason: format!("'{value}' is not a number"),
                })
        }

        match key {
            "fast_window" => self.fast_window = usize_of(key, value)?,
            "slow_window" => self.slow_window = usize_of(key, value)?,
            "breakout_lookback" => self.breakout_lookback = usize_of(key, value)?,
            "volume_window" => self.volume_window = usize_of(key, value)?,
            "volume_quantile" => self.volume_quantile = f64_of(key, value)?,
            "exit_ma_window" => self.exit_ma_window = usize_of(key, value)?,
            "rsi_window" => self.rsi_window = usize_of(key, value)?,
            "rsi_entry" => self.rsi_entry = f64_of(key, value)?,
            "rsi_exit" => self.rsi_exit = f64_of(key, value)?,
            "hold_days" => self.hold_days = usize_of(key, value)?,
            "channel_window" => self.channel_window = usize_of(key, value)?,
            "exit_low_window" => self.exit_low_window = usize_of(key, value)?,
            "volume_ratio_min" => self.volume_ratio_min = f64_of(key, value)?,
            "atr_pct_max" => self.atr_pct_max = f64_of(key, value)?,
            _ => {
                return Err(TradesightError::InvalidParameters {
                    key: key.to_string(),
                    reason: "unknown parameter".into(),
                });
            }
        }
        Ok(())
    }
}

/// Per-template boolean trigger series, index-aligned with the bars.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
}

impl SignalSeries {
    pub fn all_false(n: usize) -> Self {
        SignalSeries {
            entry: vec![false; n],
            exit: vec![false; n],
        }
    }
}

/// Run one template over the full history. `events` is only read by the
/// event-driven template; pass an empty set otherwise.
pub fn generate(
    template: TemplateId,
    bars: &[PriceBar],
    params: &TemplateParams,
    events: &BTreeSet<NaiveDate>,
) -> SignalSeries {
    match template {
        TemplateId::TrendFollowing => trend_following(bars, params),
        TemplateId::BreakoutVolume => breakout_volume(bars, params),
        TemplateId::MeanReversion => mean_reversion(bars, params),
        TemplateId::EventDriven => event_driven(bars, events),
        TemplateId::MultiFactor => multi_factor(bars, params),
    }
}

fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

fn ge(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a >= b)
}

fn lt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

fn le(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}

/// S1: enter on the first bar where close sits above the fast MA and the
/// fast MA above the slow MA after a bar where that alignment did not hold
/// (covers both a fresh price cross and the trend filter switching on);
/// exit when close drops below the fast MA.
fn trend_following(bars: &[PriceBar], params: &TemplateParams) -> SignalSeries {
    let n = bars.len();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast = sma::sma(&closes, params.fast_window);
    let slow = sma::sma(&closes, params.slow_window);

    let aligned =
        |i: usize| gt(Some(closes[i]), fast[i]) && gt(fast[i], slow[i]);

    let mut series = SignalSeries::all_false(n);
    for i in 0..n {
        if i >= 1 {
            series.entry[i] = aligned(i) && !aligned(i - 1);
        }
        series.exit[i] = lt(Some(closes[i]), fast[i]);
    }
    series
}

/// S2: enter when close clears the prior-N high on a volume spike (above the
/// q-quantile of the prior volume window); exit when close drops below a
/// short MA.
fn breakout_volume(bars: &[PriceBar], params: &TemplateParams) -> SignalSeries {
    let n = bars.len();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let prior_high = channel::prior_high(bars, params.breakout_lookback);
    let exit_ma = sma::sma(&closes, params.exit_ma_window);

    let mut series = SignalSeries::all_false(n);
    let w = params.volume_window;
    for i in 0..n {
        let close = Some(closes[i]);
        if w > 0 && i >= w {
            let threshold =
                stats::percentile(&volumes[i - w..i], params.volume_quantile * 100.0);
            series.entry[i] = gt(close, prior_high[i]) && volumes[i] > threshold;
        }
        series.exit[i] = lt(close, exit_ma[i]);
    }
    series
}

/// S3: enter when RSI crosses below the oversold threshold from above; exit
/// once RSI recovers past the exit threshold.
fn mean_reversion(bars: &[PriceBar], params: &TemplateParams) -> SignalSeries {
    let n = bars.len();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let rsi = rsi::rsi(&closes, params.rsi_window);

    let mut series = SignalSeries::all_false(n);
    for i in 1..n {
        series.entry[i] =
            lt(rsi[i], Some(params.rsi_entry)) && ge(rsi[i - 1], Some(params.rsi_entry));
        series.exit[i] = gt(rsi[i], Some(params.rsi_exit));
    }
    series
}

/// S4: entry on event-date membership; the exit series stays false because
/// the hold-days countdown lives in the simulator.
fn event_driven(bars: &[PriceBar], events: &BTreeSet<NaiveDate>) -> SignalSeries {
    let mut series = SignalSeries::all_false(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        series.entry[i] = events.contains(&bar.date);
    }
    series
}

/// S5: breakout, trend alignment, MACD momentum, KDJ, volume confirmation
/// and a volatility cap must all hold at once.
fn multi_factor(bars: &[PriceBar], params: &TemplateParams) -> SignalSeries {
    let n = bars.len();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let channel_high = channel::prior_high(bars, params.channel_window);
    let exit_low = channel::prior_low(bars, params.exit_low_window);
    let fast = sma::sma(&closes, params.fast_window);
    let slow = sma::sma(&closes, params.slow_window);
    let macd = macd::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let kdj = kdj::kdj(bars, KDJ_WINDOW);
    let volume_ma = sma::sma(&volumes, VOLUME_WINDOW);
    let atr_pct = atr::atr_pct(bars, ATR_WINDOW);

    let mut series = SignalSeries::all_false(n);
    for i in 0..n {
        let close = Some(closes[i]);
        let hist = macd.hist[i];

        let momentum = i >= 1
            && gt(hist, Some(0.0))
            && ge(hist, macd.hist[i - 1]);
        let volume_ok = matches!(volume_ma[i], Some(avg) if avg > 0.0
            && volumes[i] / avg >= params.volume_ratio_min);

        series.entry[i] = gt(close, channel_high[i])
            && gt(close, fast[i])
            && gt(fast[i], slow[i])
            && momentum
            && gt(kdj.k[i], kdj.d[i])
            && volume_ok
            && le(atr_pct[i], Some(params.atr_pct_max));

        series.exit[i] =
            lt(close, exit_low[i]) || lt(close, fast[i]) || lt(hist, Some(0.0));
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000.0,
            })
            .collect()
    }

    fn no_events() -> BTreeSet<NaiveDate> {
        BTreeSet::new()
    }

    #[test]
    fn parse_template_identifiers() {
        assert_eq!(
            TemplateId::parse("s1").unwrap(),
            TemplateId::TrendFollowing
        );
        assert_eq!(
            TemplateId::parse("MULTI_FACTOR").unwrap(),
            TemplateId::MultiFactor
        );
        assert!(matches!(
            TemplateId::parse("s9"),
            Err(TradesightError::UnsupportedTemplate { .. })
        ));
    }

    #[test]
    fn params_from_pairs() {
        let params =
            TemplateParams::from_pairs([("fast_window", "10"), ("rsi_entry", "25.0")]).unwrap();
        assert_eq!(params.fast_window, 10);
        assert_eq!(params.rsi_entry, 25.0);
        assert_eq!(params.slow_window, 60);
    }

    #[test]
    fn params_reject_bad_number() {
        let result = TemplateParams::from_pairs([("fast_window", "abc")]);
        assert!(matches!(
            result,
            Err(TradesightError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn params_reject_unknown_key() {
        let result = TemplateParams::from_pairs([("fancy_window", "3")]);
        assert!(matches!(
            result,
            Err(TradesightError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn trend_following_monotone_rise_single_entry() {
        // strictly rising closes: close stays above the fast MA once it is
        // defined, so only the first eligible bar can cross
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let params = TemplateParams::default();
        let series = generate(TemplateId::TrendFollowing, &bars, &params, &no_events());

        let entries: Vec<usize> = series
            .entry
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| e.then_some(i))
            .collect();
        // the slow MA defines on bar 59, the first bar where both conditions
        // can align at all
        assert_eq!(entries, vec![59]);
        // never exits: close never falls below the fast MA
        assert!(!series.exit.iter().any(|&e| e));
    }

    #[test]
    fn trend_following_warmup_is_false() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let series = generate(
            TemplateId::TrendFollowing,
            &bars,
            &TemplateParams::default(),
            &no_events(),
        );
        // slow MA undefined until index 59: no entry can fire before that
        for i in 0..59 {
            assert!(!series.entry[i]);
        }
    }

    #[test]
    fn breakout_needs_volume_spike() {
        let mut closes: Vec<f64> = vec![100.0; 80];
        closes[70] = 130.0; // clears every prior high
        let mut bars = make_bars(&closes);
        let params = TemplateParams::default();

        // flat volume: quantile threshold equals current volume, entry false
        let quiet = generate(TemplateId::BreakoutVolume, &bars, &params, &no_events());
        assert!(!quiet.entry[70]);

        bars[70].volume = 50_000.0;
        let loud = generate(TemplateId::BreakoutVolume, &bars, &params, &no_events());
        assert!(loud.entry[70]);
    }

    #[test]
    fn mean_reversion_cross_semantics() {
        // engineered RSI path: steady falls push RSI low, then recovery
        let mut closes = vec![100.0; 30];
        for (i, c) in closes.iter_mut().enumerate().skip(15) {
            *c = 100.0 - (i as f64 - 14.0) * 2.0;
        }
        let bars = make_bars(&closes);
        let series = generate(
            TemplateId::MeanReversion,
            &bars,
            &TemplateParams::default(),
            &no_events(),
        );
        // at most one entry: the single downside cross through 30
        let count = series.entry.iter().filter(|&&e| e).count();
        assert!(count <= 1);
    }

    #[test]
    fn event_driven_matches_dates_only() {
        let closes = vec![100.0; 10];
        let bars = make_bars(&closes);
        let mut events = BTreeSet::new();
        events.insert(bars[4].date);

        let series = generate(
            TemplateId::EventDriven,
            &bars,
            &TemplateParams::default(),
            &events,
        );
        for (i, &fired) in series.entry.iter().enumerate() {
            assert_eq!(fired, i == 4);
        }
        assert!(!series.exit.iter().any(|&e| e));
    }

    #[test]
    fn determinism_same_input_same_output() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + ((i * 13) % 17) as f64 - 8.0)
            .collect();
        let bars = make_bars(&closes);
        let params = TemplateParams::default();
        for template in TemplateId::ALL {
            let a = generate(template, &bars, &params, &no_events());
            let b = generate(template, &bars, &params, &no_events());
            assert_eq!(a, b, "{template:?} not deterministic");
        }
    }

    #[test]
    fn undefined_indicators_never_fire() {
        // series shorter than every warmup window
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0]);
        let params = TemplateParams::default();
        for template in TemplateId::ALL {
            let series = generate(template, &bars, &params, &no_events());
            assert!(!series.entry.iter().any(|&e| e), "{template:?}");
        }
    }
}
