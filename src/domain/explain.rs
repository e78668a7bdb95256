//! Human-readable explanations for each signal template, backed by the
//! template's own historical trigger record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{self, SignalSeries, TemplateId, TemplateParams};
use crate::domain::stats;

pub const HORIZONS: [usize; 3] = [5, 10, 20];

const ELEVATED_ATR_PCT: f64 = 6.0;
const ELEVATED_HISTORY_FLOOR: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    Elevated,
}

/// Distribution of forward returns after historical triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSummary {
    pub win_rate: f64,
    pub mean: f64,
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    pub horizon: usize,
    pub count: usize,
    /// Absent when no trigger has a full horizon of history after it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReturnSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalExplanation {
    pub template: String,
    pub label: String,
    pub triggered: bool,
    pub last_trigger: Option<NaiveDate>,
    pub rationale: String,
    pub evidence: String,
    pub risk: String,
    pub invalidation: String,
    pub risk_level: RiskLevel,
    pub horizons: Vec<HorizonStats>,
}

/// Build the explanation for one template over the full history.
pub fn explain_template(
    template: TemplateId,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    params: &TemplateParams,
    events: &BTreeSet<NaiveDate>,
) -> SignalExplanation {
    let signals = signal::generate(template, bars, params, events);
    let entries: Vec<usize> = (0..bars.len()).filter(|&i| signals.entry[i]).collect();

    let triggered = signals.entry.last().copied().unwrap_or(false);
    let last_trigger = entries.last().map(|&i| bars[i].date);
    let horizons = HORIZONS
        .iter()
        .map(|&h| horizon_stats(bars, &entries, h))
        .collect();

    let i = bars.len() - 1;
    let texts = template_texts(template, bars, indicators, params, &signals, i);

    SignalExplanation {
        template: template.code().to_string(),
        label: template.label().to_string(),
        triggered,
        last_trigger,
        rationale: texts.rationale,
        evidence: texts.evidence,
        risk: texts.risk,
        invalidation: texts.invalidation,
        risk_level: risk_level(bars, indicators, i),
        horizons,
    }
}

fn risk_level(bars: &[PriceBar], indicators: &IndicatorSet, i: usize) -> RiskLevel {
    let volatile = indicators.atr_pct[i].is_some_and(|a| a >= ELEVATED_ATR_PCT);
    if volatile || bars.len() < ELEVATED_HISTORY_FLOOR {
        RiskLevel::Elevated
    } else {
        RiskLevel::Normal
    }
}

fn horizon_stats(bars: &[PriceBar], entries: &[usize], horizon: usize) -> HorizonStats {
    let returns: Vec<f64> = entries
        .iter()
        .filter(|&&e| e + horizon < bars.len() && bars[e].close > 0.0)
        .map(|&e| bars[e + horizon].close / bars[e].close - 1.0)
        .collect();

    let summary = if returns.is_empty() {
        None
    } else {
        let wins = returns.iter().filter(|&&r| r > 0.0).count();
        let min = returns.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = returns.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(ReturnSummary {
            win_rate: wins as f64 / returns.len() as f64,
            mean: stats::mean(&returns),
            median: stats::median(&returns),
            p10: stats::percentile(&returns, 10.0),
            p90: stats::percentile(&returns, 90.0),
            min,
            max,
        })
    };

    HorizonStats {
        horizon,
        count: returns.len(),
        summary,
    }
}

struct TemplateTexts {
    rationale: String,
    evidence: String,
    risk: String,
    invalidation: String,
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn template_texts(
    template: TemplateId,
    bars: &[PriceBar],
    ind: &IndicatorSet,
    params: &TemplateParams,
    signals: &SignalSeries,
    i: usize,
) -> TemplateTexts {
    let close = bars[i].close;
    match template {
        TemplateId::TrendFollowing => TemplateTexts {
            rationale: format!(
                "enter when price establishes itself above the {}-day average while \
                 that average sits above the {}-day average",
                params.fast_window, params.slow_window
            ),
            evidence: format!(
                "close {close:.2}, MA{} {}, MA{} {}",
                params.fast_window,
                fmt_opt(ind.ma_fast[i]),
                params.slow_window,
                fmt_opt(ind.ma_slow[i])
            ),
            risk: "trend entries lag turns and give back gains in choppy markets".to_string(),
            invalidation: format!(
                "a close back below the {}-day average exits the position",
                params.fast_window
            ),
        },
        TemplateId::BreakoutVolume => TemplateTexts {
            rationale: format!(
                "enter on a close above the prior {}-day high confirmed by volume \
                 in the top {:.0}% of the recent range",
                params.breakout_lookback,
                (1.0 - params.volume_quantile) * 100.0
            ),
            evidence: format!(
                "close {close:.2}, prior {}-day high {}, volume {:.0}",
                params.breakout_lookback,
                fmt_opt(ind.channel_high[i]),
                bars[i].volume
            ),
            risk: "breakouts fail frequently; the volume filter reduces but does not \
                   remove false starts"
                .to_string(),
            invalidation: format!(
                "a close below the {}-day average exits the position",
                params.exit_ma_window
            ),
        },
        TemplateId::MeanReversion => TemplateTexts {
            rationale: format!(
                "enter when RSI{} drops through {} from above, betting on a snap back",
                params.rsi_window, params.rsi_entry
            ),
            evidence: format!("close {close:.2}, RSI{} {}", params.rsi_window, fmt_opt(ind.rsi[i])),
            risk: "oversold can stay oversold; a falling knife keeps this signal \
                   active all the way down"
                .to_string(),
            invalidation: format!("RSI recovering above {} exits the position", params.rsi_exit),
        },
        TemplateId::EventDriven => TemplateTexts {
            rationale: format!(
                "enter on qualifying event dates and hold for {} trading days",
                params.hold_days
            ),
            evidence: format!(
                "close {close:.2}, latest bar {} an event date",
                if signals.entry[i] { "is" } else { "is not" }
            ),
            risk: "event reactions are idiosyncratic; position sizing matters more \
                   than timing here"
                .to_string(),
            invalidation: format!(
                "the position is closed unconditionally after {} trading days",
                params.hold_days
            ),
        },
        TemplateId::MultiFactor => TemplateTexts {
            rationale: format!(
                "enter only when channel breakout, average alignment, MACD momentum, \
                 KDJ and a volume ratio of at least {:.1} all agree, with ATR% capped \
                 at {:.1}",
                params.volume_ratio_min, params.atr_pct_max
            ),
            evidence: format!(
                "close {close:.2}, channel high {}, MACD hist {}, ATR% {}",
                fmt_opt(ind.channel_high[i]),
                fmt_opt(ind.macd.hist[i]),
                fmt_opt(ind.atr_pct[i])
            ),
            risk: "stacked filters trade rarely; a small trigger count weakens the \
                   historical statistics"
                .to_string(),
            invalidation: format!(
                "a break of the {}-day low or a close below the {}-day average exits",
                params.exit_low_window, params.fast_window
            ),
        },
    }
}
