//! CSV corporate-event calendar adapter.
//!
//! A single file with columns `date,symbol,event_type,license`, one row per
//! announced event.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::domain::error::TradesightError;
use crate::ports::event_port::EventPort;

pub struct CsvEventAdapter {
    path: PathBuf,
}

impl CsvEventAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn fetch_error(reason: String) -> TradesightError {
    TradesightError::DataFetch { reason }
}

fn matches_whitelist(value: &str, whitelist: &[String]) -> bool {
    whitelist.is_empty() || whitelist.iter().any(|w| w == value)
}

impl EventPort for CsvEventAdapter {
    fn qualifying_dates(
        &self,
        symbol: &str,
        event_types: &[String],
        licenses: &[String],
    ) -> Result<BTreeSet<NaiveDate>, TradesightError> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| fetch_error(format!("failed to open {}: {e}", self.path.display())))?;

        let mut dates = BTreeSet::new();
        for result in reader.records() {
            let record = result.map_err(|e| fetch_error(format!("CSV parse error: {e}")))?;
            let row_symbol = record
                .get(1)
                .ok_or_else(|| fetch_error("missing symbol column".into()))?;
            if row_symbol != symbol {
                continue;
            }
            let event_type = record.get(2).unwrap_or("");
            let license = record.get(3).unwrap_or("");
            if !matches_whitelist(event_type, event_types) || !matches_whitelist(license, licenses)
            {
                continue;
            }

            let raw_date = record
                .get(0)
                .ok_or_else(|| fetch_error("missing date column".into()))?;
            let date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
                .map_err(|e| fetch_error(format!("invalid date format: {e}")))?;
            dates.insert(date);
        }
        Ok(dates)
    }
}
