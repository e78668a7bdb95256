//! Backtest cost model and run parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::TradesightError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    /// Proportional commission charged on both legs (e.g. 0.0003).
    pub commission_rate: f64,
    /// Stamp duty charged on the sell leg only.
    pub stamp_duty_rate: f64,
    /// Execution-price penalty in basis points, charged against the trader.
    pub slippage_bps: f64,
    /// Minimum tradable share increment; buys round down to a multiple.
    pub lot_size: i64,
    /// Explicit out-of-sample start. When absent and the series spans at
    /// least 252 bars, the split defaults to 252 bars before the end.
    pub oos_start: Option<NaiveDate>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 100_000.0,
            commission_rate: 0.0003,
            stamp_duty_rate: 0.001,
            slippage_bps: 0.0,
            lot_size: 100,
            oos_start: None,
        }
    }
}

impl BacktestConfig {
    /// Read the `[backtest]` section, falling back to defaults per key.
    pub fn from_config(adapter: &dyn ConfigPort) -> Result<Self, TradesightError> {
        let defaults = BacktestConfig::default();
        let oos_start = match adapter.get_string("backtest", "oos_start") {
            None => None,
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                TradesightError::ConfigInvalid {
                    section: "backtest".into(),
                    key: "oos_start".into(),
                    reason: e.to_string(),
                }
            })?),
        };

        let config = BacktestConfig {
            initial_cash: adapter.get_double("backtest", "initial_cash", defaults.initial_cash),
            commission_rate: adapter.get_double(
                "backtest",
                "commission_rate",
                defaults.commission_rate,
            ),
            stamp_duty_rate: adapter.get_double(
                "backtest",
                "stamp_duty_rate",
                defaults.stamp_duty_rate,
            ),
            slippage_bps: adapter.get_double("backtest", "slippage_bps", defaults.slippage_bps),
            lot_size: adapter.get_int("backtest", "lot_size", defaults.lot_size),
            oos_start,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TradesightError> {
        fn invalid(key: &str, reason: &str) -> TradesightError {
            TradesightError::ConfigInvalid {
                section: "backtest".into(),
                key: key.into(),
                reason: reason.into(),
            }
        }

        if self.initial_cash <= 0.0 {
            return Err(invalid("initial_cash", "must be positive"));
        }
        if self.commission_rate < 0.0 || self.stamp_duty_rate < 0.0 {
            return Err(invalid("commission_rate", "rates must be non-negative"));
        }
        if self.slippage_bps < 0.0 {
            return Err(invalid("slippage_bps", "must be non-negative"));
        }
        if self.lot_size <= 0 {
            return Err(invalid("lot_size", "must be positive"));
        }
        Ok(())
    }
}
