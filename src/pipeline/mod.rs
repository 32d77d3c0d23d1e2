// Sales ledger pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::Region;
use crate::error::Result;
use crate::metrics;
use processing::{merge_with_stats, validate, MergeStats, ValidationReport};
use storage::SqliteLedger;

/// Outcome of one Read -> Transform -> Load -> Validate run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_read: BTreeMap<Region, usize>,
    pub merge: MergeStats,
    pub report: ValidationReport,
}

/// Runs the full job against the configured sources and SQLite database.
///
/// Any stage failure aborts the run. The database connection is scoped to
/// this call and released on every exit path.
pub fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = tracing::info_span!("ledger_run", run_id = %run_id);
    let _enter = span.enter();

    let delimiter = config.delimiter_byte()?;
    let region_a = {
        let _timing = metrics::time_stage("read");
        ingestion::read_region(&config.sources.region_a, Region::A, delimiter)?
    };
    let region_b = {
        let _timing = metrics::time_stage("read");
        ingestion::read_region(&config.sources.region_b, Region::B, delimiter)?
    };
    let rows_read = BTreeMap::from([(Region::A, region_a.len()), (Region::B, region_b.len())]);
    for (region, rows) in &rows_read {
        metrics::record_rows_read(*region, *rows);
    }

    let (records, merge) = {
        let _timing = metrics::time_stage("transform");
        merge_with_stats(region_a, region_b)
    };
    metrics::record_duplicates_dropped(merge.duplicates_dropped);
    metrics::record_non_positive_dropped(merge.non_positive_dropped);

    let mut ledger = SqliteLedger::open(&config.store.database)?;
    storage::store(&mut ledger, &records, &config.store.table)?;
    let report = validate(&ledger, &config.store.table)?;
    ledger.close()?;

    let finished_at = Utc::now();
    info!(
        records = report.total_records,
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "Run complete"
    );

    Ok(RunSummary {
        run_id,
        started_at,
        finished_at,
        rows_read,
        merge,
        report,
    })
}
