use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::{check_table_name, LedgerStore, OrderIdCounts};
use crate::domain::{MergedOrderRecord, Region};
use crate::error::{LedgerError, Result};

/// In-memory ledger store for development/testing
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    tables: HashMap<String, Vec<MergedOrderRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, table: &str) -> Result<&[MergedOrderRecord]> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| LedgerError::TableNotFound(table.to_string()))
    }
}

impl LedgerStore for InMemoryLedger {
    fn replace_ledger(&mut self, table: &str, records: &[MergedOrderRecord]) -> Result<()> {
        check_table_name(table)?;
        self.tables.insert(table.to_string(), records.to_vec());
        debug!(table, rows = records.len(), "Replaced in-memory ledger");
        Ok(())
    }

    fn record_count(&self, table: &str) -> Result<u64> {
        Ok(self.table(table)?.len() as u64)
    }

    fn sales_by_region(&self, table: &str) -> Result<BTreeMap<Region, f64>> {
        let mut totals = BTreeMap::new();
        for record in self.table(table)? {
            *totals.entry(record.region).or_insert(0.0) += record.total_sales;
        }
        Ok(totals)
    }

    fn average_net_sale(&self, table: &str) -> Result<Option<f64>> {
        let records = self.table(table)?;
        if records.is_empty() {
            return Ok(None);
        }
        let sum: f64 = records.iter().map(|r| r.net_sale).sum();
        Ok(Some(sum / records.len() as f64))
    }

    fn order_id_counts(&self, table: &str) -> Result<OrderIdCounts> {
        let ids: Vec<&str> = self.table(table)?.iter().filter_map(MergedOrderRecord::order_id).collect();
        let distinct: HashSet<&str> = ids.iter().copied().collect();
        Ok(OrderIdCounts {
            distinct: distinct.len() as u64,
            total: ids.len() as u64,
        })
    }
}
