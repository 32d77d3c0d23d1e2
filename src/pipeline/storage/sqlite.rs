use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::{check_table_name, extra_columns, LedgerStore, OrderIdCounts, NET_SALE, REGION, TOTAL_SALES};
use crate::domain::{MergedOrderRecord, Region};
use crate::error::{LedgerError, Result};
use crate::pipeline::ingestion::reader::{ITEM_PRICE, ORDER_ID, PROMOTION_DISCOUNT, QUANTITY_ORDERED};

/// Sales ledger persisted in a SQLite database file.
///
/// The connection is held for the lifetime of the value and closed on drop;
/// use [`SqliteLedger::close`] to observe close failures.
pub struct SqliteLedger {
    conn: Connection,
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

impl SqliteLedger {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(database = %path.display(), "Opened ledger database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| LedgerError::Database(e))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn create_table_sql(table: &str, extra: &[String]) -> String {
        let mut columns = vec![
            format!("{} TEXT", quote(ORDER_ID)),
            format!("{} INTEGER", quote(QUANTITY_ORDERED)),
            format!("{} REAL", quote(ITEM_PRICE)),
            format!("{} REAL", quote(PROMOTION_DISCOUNT)),
        ];
        columns.extend(extra.iter().map(|name| format!("{} TEXT", quote(name))));
        columns.push(format!("{} TEXT", quote(REGION)));
        columns.push(format!("{} REAL", quote(TOTAL_SALES)));
        columns.push(format!("{} REAL", quote(NET_SALE)));

        format!("CREATE TABLE {} ({})", quote(table), columns.join(", "))
    }

    fn row_values(record: &MergedOrderRecord, extra: &[String]) -> Vec<Value> {
        let raw = &record.record;
        let mut values = vec![
            raw.order_id.clone().map(Value::Text).unwrap_or(Value::Null),
            Value::Integer(raw.quantity_ordered),
            Value::Real(raw.item_price),
            Value::Real(raw.promotion_discount),
        ];
        for name in extra {
            let cell = raw.extra.iter().find(|(column, _)| column == name);
            values.push(match cell {
                Some((_, value)) => Value::Text(value.clone()),
                None => Value::Null,
            });
        }
        values.push(Value::Text(record.region.as_str().to_string()));
        values.push(Value::Real(record.total_sales));
        values.push(Value::Real(record.net_sale));
        values
    }
}

impl LedgerStore for SqliteLedger {
    fn replace_ledger(&mut self, table: &str, records: &[MergedOrderRecord]) -> Result<()> {
        check_table_name(table)?;
        let extra = extra_columns(records);
        let column_count = 4 + extra.len() + 3;
        let placeholders = vec!["?"; column_count].join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote(table)))?;
        tx.execute_batch(&Self::create_table_sql(table, &extra))?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", quote(table), placeholders))?;
            for record in records {
                stmt.execute(params_from_iter(Self::row_values(record, &extra)))?;
            }
        }
        tx.commit()?;

        debug!(table, rows = records.len(), extra_columns = extra.len(), "Wrote ledger table");
        Ok(())
    }

    fn record_count(&self, table: &str) -> Result<u64> {
        check_table_name(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote(table)), [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn sales_by_region(&self, table: &str) -> Result<BTreeMap<Region, f64>> {
        check_table_name(table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {region}, SUM({total}) FROM {table} GROUP BY {region}",
            region = quote(REGION),
            total = quote(TOTAL_SALES),
            table = quote(table),
        ))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<f64>>(1)?)))?;

        let mut totals = BTreeMap::new();
        for row in rows {
            let (tag, sum) = row?;
            let region: Region = tag.as_deref().unwrap_or("NULL").parse()?;
            totals.insert(region, sum.unwrap_or(0.0));
        }
        Ok(totals)
    }

    fn average_net_sale(&self, table: &str) -> Result<Option<f64>> {
        check_table_name(table)?;
        let average: Option<f64> = self.conn.query_row(
            &format!("SELECT AVG({}) FROM {}", quote(NET_SALE), quote(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(average)
    }

    fn order_id_counts(&self, table: &str) -> Result<OrderIdCounts> {
        check_table_name(table)?;
        let (distinct, total): (i64, i64) = self.conn.query_row(
            &format!(
                "SELECT COUNT(DISTINCT {id}), COUNT({id}) FROM {table}",
                id = quote(ORDER_ID),
                table = quote(table),
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(OrderIdCounts {
            distinct: distinct as u64,
            total: total as u64,
        })
    }
}
