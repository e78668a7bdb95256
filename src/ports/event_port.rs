//! Corporate-event calendar port trait.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::error::TradesightError;

pub trait EventPort {
    /// Event dates for `symbol` matching the event-type and license
    /// whitelists. An empty whitelist matches everything.
    fn qualifying_dates(
        &self,
        symbol: &str,
        event_types: &[String],
        licenses: &[String],
    ) -> Result<BTreeSet<NaiveDate>, TradesightError>;
}
