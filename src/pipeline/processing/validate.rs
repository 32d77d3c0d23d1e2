use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::domain::Region;
use crate::error::Result;
use crate::metrics;
use crate::pipeline::storage::{LedgerStore, OrderIdCounts};

/// Aggregate checks over a stored sales ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub total_records: u64,
    /// Summed `total_sales` per region present in the ledger
    pub sales_by_region: BTreeMap<Region, f64>,
    /// `None` when the ledger is empty
    pub average_net_sale: Option<f64>,
    pub distinct_order_ids: u64,
    pub total_order_ids: u64,
    pub no_duplicate_order_ids: bool,
}

impl ValidationReport {
    pub fn new(
        total_records: u64,
        sales_by_region: BTreeMap<Region, f64>,
        average_net_sale: Option<f64>,
        order_ids: OrderIdCounts,
    ) -> Self {
        Self {
            total_records,
            sales_by_region,
            average_net_sale,
            distinct_order_ids: order_ids.distinct,
            total_order_ids: order_ids.total,
            no_duplicate_order_ids: order_ids.distinct == order_ids.total,
        }
    }
}

/// Runs the record count, sales-by-region, average net sale and duplicate
/// `OrderId` checks against `table`.
pub fn validate<S: LedgerStore + ?Sized>(store: &S, table: &str) -> Result<ValidationReport> {
    let _timing = metrics::time_stage("validate");

    let report = ValidationReport::new(
        store.record_count(table)?,
        store.sales_by_region(table)?,
        store.average_net_sale(table)?,
        store.order_id_counts(table)?,
    );

    if report.no_duplicate_order_ids {
        info!(table = %table, records = report.total_records, "Ledger validated");
    } else {
        warn!(
            table = %table,
            distinct = report.distinct_order_ids,
            total = report.total_order_ids,
            "Ledger contains duplicate OrderId values"
        );
    }
    Ok(report)
}
