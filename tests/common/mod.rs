#![allow(dead_code)]

//! Shared helpers for integration tests.

use chrono::NaiveDate;
use tradesight::domain::ohlcv::PriceBar;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(day: usize, close: f64) -> PriceBar {
    PriceBar {
        date: date(2023, 1, 2) + chrono::Duration::days(day as i64),
        open: close,
        high: close * 1.005,
        low: close * 0.995,
        close,
        volume: 10_000.0,
    }
}

/// Bars with per-bar closes; open equals close, range 1% of price.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

/// Strictly rising series that compounds 0.5% per bar.
pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 * 1.005_f64.powi(i as i32)).collect()
}

/// CSV content for the price adapter, header included.
pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
