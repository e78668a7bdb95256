//! Performance measurement over an equity curve, plus the in-sample /
//! out-of-sample split and the validation warnings attached to a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::execution::{EquityPoint, Trade};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

const MAX_DRAWDOWN_THRESHOLD: f64 = -0.25;
const MIN_TRADES_FOR_CONFIDENCE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub calmar: f64,
    pub win_rate: f64,
    pub closed_trades: usize,
}

impl Metrics {
    /// `base_equity` is the capital at the start of the segment: initial
    /// cash for a full run or the in-sample segment, the in-sample final
    /// equity for the out-of-sample segment.
    pub fn compute(curve: &[EquityPoint], base_equity: f64, trades: &[Trade]) -> Self {
        if curve.is_empty() || base_equity <= 0.0 {
            return Metrics {
                total_return: 0.0,
                cagr: 0.0,
                max_drawdown: 0.0,
                sharpe: 0.0,
                calmar: 0.0,
                win_rate: 0.0,
                closed_trades: trades.len(),
            };
        }

        let final_equity = curve[curve.len() - 1].equity;
        let total_return = final_equity / base_equity - 1.0;
        let years = curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let cagr = (1.0 + total_return).powf(1.0 / years) - 1.0;
        let max_drawdown = max_drawdown(curve, base_equity);
        let sharpe = sharpe_ratio(curve, base_equity);
        let calmar = if max_drawdown == 0.0 {
            0.0
        } else {
            cagr / max_drawdown.abs()
        };
        let wins = trades.iter().filter(|t| t.return_pct > 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64
        };

        Metrics {
            total_return,
            cagr,
            max_drawdown,
            sharpe,
            calmar,
            win_rate,
            closed_trades: trades.len(),
        }
    }
}

/// Deepest peak-to-trough decline, expressed as a non-positive fraction.
/// The pre-segment equity counts as the starting peak.
fn max_drawdown(curve: &[EquityPoint], base_equity: f64) -> f64 {
    let mut peak = base_equity;
    let mut worst = 0.0_f64;
    for point in curve {
        peak = peak.max(point.equity);
        worst = worst.min(point.equity / peak - 1.0);
    }
    worst
}

/// Annualized mean-over-stdev of daily equity returns, zero-risk-free.
/// A flat curve has zero deviation and reports zero rather than NaN.
fn sharpe_ratio(curve: &[EquityPoint], base_equity: f64) -> f64 {
    let mut returns = Vec::with_capacity(curve.len());
    let mut prev = base_equity;
    for point in curve {
        if prev > 0.0 {
            returns.push(point.equity / prev - 1.0);
        }
        prev = point.equity;
    }
    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let stdev = variance.sqrt();
    if stdev == 0.0 {
        return 0.0;
    }
    mean / stdev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Metrics for one side of the in-sample / out-of-sample split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metrics: Metrics,
}

/// Split the curve into in-sample and out-of-sample segments.
///
/// An explicit `oos_start` wins; otherwise the final 252 bars are held out
/// when the curve spans at least that many, and shorter curves are not
/// split at all. The out-of-sample segment compounds from the in-sample
/// final equity.
pub fn split_evaluate(
    curve: &[EquityPoint],
    trades: &[Trade],
    initial_cash: f64,
    oos_start: Option<NaiveDate>,
) -> (Option<SegmentReport>, Option<SegmentReport>) {
    let split_idx = match oos_start {
        Some(date) => curve.iter().position(|p| p.date >= date),
        None => {
            if curve.len() >= TRADING_DAYS_PER_YEAR as usize {
                Some(curve.len() - TRADING_DAYS_PER_YEAR as usize)
            } else {
                None
            }
        }
    };
    let Some(split_idx) = split_idx else {
        return (None, None);
    };
    if split_idx == 0 || split_idx >= curve.len() {
        return (None, None);
    }

    let (is_curve, oos_curve) = curve.split_at(split_idx);
    let split_date = oos_curve[0].date;
    let (is_trades, oos_trades): (Vec<Trade>, Vec<Trade>) = trades
        .iter()
        .cloned()
        .partition(|t| t.exit_date < split_date);

    let is_report = SegmentReport {
        start: is_curve[0].date,
        end: is_curve[is_curve.len() - 1].date,
        metrics: Metrics::compute(is_curve, initial_cash, &is_trades),
    };
    let oos_base = is_curve[is_curve.len() - 1].equity;
    let oos_report = SegmentReport {
        start: oos_curve[0].date,
        end: oos_curve[oos_curve.len() - 1].date,
        metrics: Metrics::compute(oos_curve, oos_base, &oos_trades),
    };
    (Some(is_report), Some(oos_report))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    DrawdownExceeded,
    LowTradeCount,
    PossibleOverfitting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub message: String,
}

pub fn validation_warnings(
    overall: &Metrics,
    in_sample: Option<&Metrics>,
    out_of_sample: Option<&Metrics>,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if overall.max_drawdown < MAX_DRAWDOWN_THRESHOLD {
        warnings.push(ValidationWarning {
            kind: WarningKind::DrawdownExceeded,
            message: format!(
                "max drawdown {:.1}% exceeded threshold of {:.0}%",
                overall.max_drawdown * 100.0,
                MAX_DRAWDOWN_THRESHOLD * 100.0
            ),
        });
    }
    if overall.closed_trades < MIN_TRADES_FOR_CONFIDENCE {
        warnings.push(ValidationWarning {
            kind: WarningKind::LowTradeCount,
            message: format!(
                "only {} closed trades, results have low confidence",
                overall.closed_trades
            ),
        });
    }
    if let (Some(is), Some(oos)) = (in_sample, out_of_sample) {
        if is.sharpe > 0.0 && oos.sharpe < 0.5 * is.sharpe {
            warnings.push(ValidationWarning {
                kind: WarningKind::PossibleOverfitting,
                message: format!(
                    "out-of-sample Sharpe {:.2} is below half of in-sample {:.2}, possible overfitting",
                    oos.sharpe, is.sharpe
                ),
            });
        }
    }
    warnings
}
