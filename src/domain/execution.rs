//! Single-position, long-only order simulator.
//!
//! Signals evaluated on bar `i` execute at the open of bar `i + 1`; a signal
//! on the final bar has no next open and is dropped. Slippage always works
//! against the trader. A position still open after the last bar is closed at
//! that bar's close with sell-side costs applied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::backtest::BacktestConfig;
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::SignalSeries;

#[derive(Debug, Clone)]
struct Position {
    shares: i64,
    entry_price: f64,
    entry_date: NaiveDate,
    entry_commission: f64,
}

/// One completed round trip. `pnl` is net of both commissions and stamp duty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: i64,
    pub pnl: f64,
    pub return_pct: f64,
}

/// Mark-to-market snapshot taken at every bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub cash: f64,
    pub position_value: f64,
    pub shares: i64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingOrder {
    Buy,
    Sell,
}

/// Run the simulator over `bars` with entry/exit flags from `signals`.
///
/// `hold_days` enables the time-based exit used by event-driven runs: the
/// counter starts at entry, decrements once per bar held, and schedules a
/// sell for the next open when it reaches zero.
pub fn simulate(
    bars: &[PriceBar],
    signals: &SignalSeries,
    config: &BacktestConfig,
    hold_days: Option<usize>,
) -> SimulationResult {
    let slip = config.slippage_bps / 10_000.0;
    let mut cash = config.initial_cash;
    let mut position: Option<Position> = None;
    let mut hold_left: usize = 0;
    let mut pending: Option<PendingOrder> = None;

    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        match pending.take() {
            Some(PendingOrder::Buy) if position.is_none() => {
                let exec = bar.open * (1.0 + slip);
                let affordable = (cash / (exec * (1.0 + config.commission_rate))).floor() as i64;
                let shares = (affordable / config.lot_size) * config.lot_size;
                // an unaffordable lot is a silent no-op, not an error
                if shares > 0 {
                    let cost = shares as f64 * exec;
                    let commission = cost * config.commission_rate;
                    cash -= cost + commission;
                    position = Some(Position {
                        shares,
                        entry_price: exec,
                        entry_date: bar.date,
                        entry_commission: commission,
                    });
                    hold_left = hold_days.unwrap_or(0);
                }
            }
            Some(PendingOrder::Sell) => {
                if let Some(pos) = position.take() {
                    let exec = bar.open * (1.0 - slip);
                    trades.push(close_out(&mut cash, pos, exec, bar.date, config));
                }
            }
            _ => {}
        }

        match &position {
            Some(_) => {
                let timed_out = hold_days.is_some() && {
                    hold_left = hold_left.saturating_sub(1);
                    hold_left == 0
                };
                if signals.exit[i] || timed_out {
                    pending = Some(PendingOrder::Sell);
                }
            }
            None => {
                if signals.entry[i] {
                    pending = Some(PendingOrder::Buy);
                }
            }
        }

        let position_value = position.as_ref().map_or(0.0, |p| p.shares as f64 * bar.close);
        let shares = position.as_ref().map_or(0, |p| p.shares);
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: cash + position_value,
            cash,
            position_value,
            shares,
        });
    }

    // forced liquidation at the final close, sell-side costs included
    if let Some(pos) = position.take() {
        if let Some(last) = bars.last() {
            let exec = last.close * (1.0 - slip);
            trades.push(close_out(&mut cash, pos, exec, last.date, config));
            if let Some(point) = equity_curve.last_mut() {
                point.equity = cash;
                point.cash = cash;
                point.position_value = 0.0;
                point.shares = 0;
            }
        }
    }

    SimulationResult {
        equity_curve,
        trades,
    }
}

fn close_out(
    cash: &mut f64,
    position: Position,
    exec: f64,
    date: NaiveDate,
    config: &BacktestConfig,
) -> Trade {
    let proceeds = position.shares as f64 * exec;
    let commission = proceeds * config.commission_rate;
    let tax = proceeds * config.stamp_duty_rate;
    *cash += proceeds - commission - tax;

    Trade {
        entry_date: position.entry_date,
        entry_price: position.entry_price,
        exit_date: date,
        exit_price: exec,
        shares: position.shares,
        pnl: (exec - position.entry_price) * position.shares as f64
            - position.entry_commission
            - commission
            - tax,
        return_pct: exec / position.entry_price - 1.0,
    }
}
