//! tradesight — technical-signal research and backtesting core.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`], and the
//! read-through [`service`] wiring them together.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod service;
