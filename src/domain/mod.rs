//! Core domain types and logic.

pub mod backtest;
pub mod engine;
pub mod error;
pub mod execution;
pub mod explain;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod signal;
pub mod stats;
pub mod timing;
