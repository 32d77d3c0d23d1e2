// Pipeline storage: the ledger store boundary and its backends

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryLedger;
pub use sqlite::SqliteLedger;

use std::collections::BTreeMap;
use tracing::info;

use crate::config::is_valid_table_name;
use crate::domain::{MergedOrderRecord, Region};
use crate::error::{LedgerError, Result};
use crate::metrics;

pub const REGION: &str = "region";
pub const TOTAL_SALES: &str = "total_sales";
pub const NET_SALE: &str = "net_sale";

/// Columns computed by the merge and appended after the source columns
pub const DERIVED_COLUMNS: [&str; 3] = [REGION, TOTAL_SALES, NET_SALE];

/// Non-null `OrderId` counts, as `COUNT(DISTINCT OrderId)` and `COUNT(OrderId)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderIdCounts {
    pub distinct: u64,
    pub total: u64,
}

/// A named-table store for the sales ledger with the aggregate queries the
/// validator needs.
pub trait LedgerStore {
    /// Drops any existing table named `table` and writes `records` in its place.
    fn replace_ledger(&mut self, table: &str, records: &[MergedOrderRecord]) -> Result<()>;

    fn record_count(&self, table: &str) -> Result<u64>;

    /// Summed `total_sales` per region; regions without rows are absent.
    fn sales_by_region(&self, table: &str) -> Result<BTreeMap<Region, f64>>;

    /// Mean `net_sale`, or `None` for an empty ledger.
    fn average_net_sale(&self, table: &str) -> Result<Option<f64>>;

    fn order_id_counts(&self, table: &str) -> Result<OrderIdCounts>;
}

pub(crate) fn check_table_name(table: &str) -> Result<()> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(LedgerError::InvalidTableName(table.to_string()))
    }
}

/// Source column names beyond the required four, in first-seen order across `records`.
pub(crate) fn extra_columns(records: &[MergedOrderRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in &record.record.extra {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

/// Replaces the ledger stored under `destination` with `records`.
pub fn store<S: LedgerStore + ?Sized>(store: &mut S, records: &[MergedOrderRecord], destination: &str) -> Result<()> {
    let _timing = metrics::time_stage("load");
    store.replace_ledger(destination, records)?;
    metrics::record_rows_written(records.len());
    info!(table = %destination, rows = records.len(), "Replaced sales ledger");
    Ok(())
}
