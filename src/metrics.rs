//! Pipeline metrics.
//!
//! Counters and histograms are recorded through the `metrics` facade. Nothing
//! is exported unless the embedding process installs a recorder.

use std::time::Instant;

use crate::domain::Region;

pub const ROWS_READ: &str = "sales_ledger_rows_read_total";
pub const ROWS_DROPPED: &str = "sales_ledger_rows_dropped_total";
pub const ROWS_WRITTEN: &str = "sales_ledger_rows_written_total";
pub const STAGE_DURATION: &str = "sales_ledger_stage_duration_seconds";

pub fn record_rows_read(region: Region, rows: usize) {
    ::metrics::counter!(ROWS_READ, "region" => region.as_str()).increment(rows as u64);
}

pub fn record_duplicates_dropped(rows: usize) {
    ::metrics::counter!(ROWS_DROPPED, "reason" => "duplicate_order_id").increment(rows as u64);
}

pub fn record_non_positive_dropped(rows: usize) {
    ::metrics::counter!(ROWS_DROPPED, "reason" => "non_positive_net_sale").increment(rows as u64);
}

pub fn record_rows_written(rows: usize) {
    ::metrics::counter!(ROWS_WRITTEN).increment(rows as u64);
}

/// A timing guard that records the stage duration when dropped
pub struct TimingGuard {
    start: Instant,
    stage: &'static str,
}

impl TimingGuard {
    pub fn new(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        ::metrics::histogram!(STAGE_DURATION, "stage" => self.stage).record(duration);
    }
}

/// Usage:
/// ```ignore
/// let _timing = time_stage("transform");
/// // ... do work ...
/// ```
pub fn time_stage(stage: &'static str) -> TimingGuard {
    TimingGuard::new(stage)
}
