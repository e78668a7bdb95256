//! Entry points tying indicators, templates, the simulator and the report
//! builders together.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TradesightError;
use crate::domain::execution::{self, EquityPoint, Trade};
use crate::domain::explain::{self, SignalExplanation};
use crate::domain::indicator::IndicatorSet;
use crate::domain::metrics::{self, Metrics, SegmentReport, ValidationWarning};
use crate::domain::ohlcv::{self, PriceBar};
use crate::domain::signal::{self, TemplateId, TemplateParams};
use crate::domain::timing::TimingReport;

pub const MIN_EXPLAIN_BARS: usize = 80;
pub const MIN_BACKTEST_BARS: usize = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainReport {
    pub signals: Vec<SignalExplanation>,
    pub timing: TimingReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub template: String,
    pub metrics: Metrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub in_sample: Option<SegmentReport>,
    pub out_of_sample: Option<SegmentReport>,
    pub warnings: Vec<ValidationWarning>,
}

/// Explain all five templates plus the composite timing read.
pub fn explain_signals(
    bars: &[PriceBar],
    events: &BTreeSet<NaiveDate>,
) -> Result<ExplainReport, TradesightError> {
    if bars.len() < MIN_EXPLAIN_BARS {
        return Err(TradesightError::InsufficientData {
            bars: bars.len(),
            minimum: MIN_EXPLAIN_BARS,
        });
    }
    ohlcv::validate_series(bars)?;

    let indicators = IndicatorSet::compute(bars);
    let params = TemplateParams::default();
    let signals = TemplateId::ALL
        .iter()
        .map(|&template| explain::explain_template(template, bars, &indicators, &params, events))
        .collect();

    Ok(ExplainReport {
        signals,
        timing: TimingReport::build(bars, &indicators),
    })
}

/// Simulate one template over the history and measure the result.
pub fn run_backtest(
    bars: &[PriceBar],
    template: TemplateId,
    params: &TemplateParams,
    config: &BacktestConfig,
    events: &BTreeSet<NaiveDate>,
) -> Result<BacktestReport, TradesightError> {
    if bars.len() < MIN_BACKTEST_BARS {
        return Err(TradesightError::InsufficientData {
            bars: bars.len(),
            minimum: MIN_BACKTEST_BARS,
        });
    }
    ohlcv::validate_series(bars)?;
    config.validate()?;

    let signals = signal::generate(template, bars, params, events);
    let hold_days = (template == TemplateId::EventDriven).then_some(params.hold_days);
    let result = execution::simulate(bars, &signals, config, hold_days);

    let overall = Metrics::compute(&result.equity_curve, config.initial_cash, &result.trades);
    let (in_sample, out_of_sample) = metrics::split_evaluate(
        &result.equity_curve,
        &result.trades,
        config.initial_cash,
        config.oos_start,
    );
    let warnings = metrics::validation_warnings(
        &overall,
        in_sample.as_ref().map(|s| &s.metrics),
        out_of_sample.as_ref().map(|s| &s.metrics),
    );

    Ok(BacktestReport {
        template: template.code().to_string(),
        metrics: overall,
        equity_curve: result.equity_curve,
        trades: result.trades,
        in_sample,
        out_of_sample,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.23).sin() * 4.0 + i as f64 * 0.02;
                PriceBar {
                    date: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
                        + chrono::Duration::days(i as i64),
                    open: close * 0.999,
                    high: close * 1.006,
                    low: close * 0.994,
                    close,
                    volume: 10_000.0 + (i % 9) as f64 * 700.0,
                }
            })
            .collect()
    }

    #[test]
    fn explain_rejects_short_history() {
        let bars = make_bars(79);
        let err = explain_signals(&bars, &BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err,
            TradesightError::InsufficientData {
                bars: 79,
                minimum: MIN_EXPLAIN_BARS
            }
        ));
    }

    #[test]
    fn explain_rejects_empty_history() {
        let err = explain_signals(&[], &BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err,
            TradesightError::InsufficientData { bars: 0, .. }
        ));
    }

    #[test]
    fn explain_covers_all_templates() {
        let bars = make_bars(200);
        let report = explain_signals(&bars, &BTreeSet::new()).unwrap();
        assert_eq!(report.signals.len(), TemplateId::ALL.len());
        assert_eq!(report.timing.disclaimers.len(), 2);
    }

    #[test]
    fn backtest_rejects_short_history() {
        let bars = make_bars(119);
        let err = run_backtest(
            &bars,
            TemplateId::TrendFollowing,
            &TemplateParams::default(),
            &BacktestConfig::default(),
            &BTreeSet::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TradesightError::InsufficientData {
                bars: 119,
                minimum: MIN_BACKTEST_BARS
            }
        ));
    }

    #[test]
    fn backtest_produces_full_curve() {
        let bars = make_bars(260);
        let report = run_backtest(
            &bars,
            TemplateId::TrendFollowing,
            &TemplateParams::default(),
            &BacktestConfig::default(),
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(report.equity_curve.len(), 260);
        assert!(report.metrics.max_drawdown <= 0.0);
        // 260 bars, so the default year-end holdout applies
        assert!(report.in_sample.is_some());
        assert!(report.out_of_sample.is_some());
    }

    #[test]
    fn backtest_rejects_unordered_bars() {
        let mut bars = make_bars(150);
        bars.swap(10, 11);
        let err = run_backtest(
            &bars,
            TemplateId::TrendFollowing,
            &TemplateParams::default(),
            &BacktestConfig::default(),
            &BTreeSet::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TradesightError::DataFetch { .. }));
    }

    #[test]
    fn event_backtest_closes_by_hold_days() {
        let bars = make_bars(150);
        let mut events = BTreeSet::new();
        events.insert(bars[60].date);
        let mut params = TemplateParams::default();
        params.hold_days = 3;

        let report = run_backtest(
            &bars,
            TemplateId::EventDriven,
            &params,
            &BacktestConfig {
                lot_size: 1,
                ..BacktestConfig::default()
            },
            &events,
        )
        .unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].entry_date, bars[61].date);
        assert_eq!(report.trades[0].exit_date, bars[64].date);
    }
}
