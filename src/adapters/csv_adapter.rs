//! CSV price history adapter.
//!
//! Expects one `<symbol>.csv` per symbol under a base directory with a
//! header row and columns `date,open,high,low,close,volume`, dates in
//! `%Y-%m-%d`. Rows may arrive unsorted; the adapter sorts and validates
//! before handing the series to the caller.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::error::TradesightError;
use crate::domain::ohlcv::{self, PriceBar};
use crate::ports::price_port::PricePort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn fetch_error(reason: String) -> TradesightError {
    TradesightError::DataFetch { reason }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, TradesightError> {
    record
        .get(idx)
        .ok_or_else(|| fetch_error(format!("missing {name} column")))
}

fn numeric(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, TradesightError> {
    field(record, idx, name)?
        .trim()
        .parse()
        .map_err(|e| fetch_error(format!("invalid {name} value: {e}")))
}

impl PricePort for CsvAdapter {
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PriceBar>, TradesightError> {
        let path = self.csv_path(symbol);
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| fetch_error(format!("failed to open {}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| fetch_error(format!("CSV parse error: {e}")))?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?.trim(), "%Y-%m-%d")
                .map_err(|e| fetch_error(format!("invalid date format: {e}")))?;
            bars.push(PriceBar {
                date,
                open: numeric(&record, 1, "open")?,
                high: numeric(&record, 2, "high")?,
                low: numeric(&record, 3, "low")?,
                close: numeric(&record, 4, "close")?,
                volume: numeric(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        ohlcv::validate_series(&bars)?;
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, symbol: &str, content: &str) {
        fs::write(dir.path().join(format!("{symbol}.csv")), content).unwrap();
    }

    const HEADER: &str = "date,open,high,low,close,volume\n";

    #[test]
    fn reads_well_formed_file() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "TEST",
            &format!(
                "{HEADER}2024-01-02,10.0,10.5,9.8,10.2,1000\n2024-01-03,10.2,10.8,10.1,10.6,1200\n"
            ),
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_daily("TEST").unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].close, 10.6);
    }

    #[test]
    fn sorts_out_of_order_rows() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "TEST",
            &format!(
                "{HEADER}2024-01-03,10.2,10.8,10.1,10.6,1200\n2024-01-02,10.0,10.5,9.8,10.2,1000\n"
            ),
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_daily("TEST").unwrap();
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_daily("NOPE"),
            Err(TradesightError::DataFetch { .. })
        ));
    }

    #[test]
    fn bad_number_is_a_fetch_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "TEST", &format!("{HEADER}2024-01-02,ten,10.5,9.8,10.2,1000\n"));
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_daily("TEST"),
            Err(TradesightError::DataFetch { .. })
        ));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "TEST",
            &format!(
                "{HEADER}2024-01-02,10.0,10.5,9.8,10.2,1000\n2024-01-02,10.2,10.8,10.1,10.6,1200\n"
            ),
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_daily("TEST"),
            Err(TradesightError::DataFetch { .. })
        ));
    }

    #[test]
    fn inconsistent_bar_body_is_rejected() {
        let dir = TempDir::new().unwrap();
        // high below close
        write_csv(&dir, "TEST", &format!("{HEADER}2024-01-02,10.0,10.1,9.8,10.4,1000\n"));
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_daily("TEST"),
            Err(TradesightError::DataFetch { .. })
        ));
    }
}
