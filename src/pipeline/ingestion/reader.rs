use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::domain::{RawOrderRecord, Region, TaggedOrder};
use crate::error::{LedgerError, Result};
use crate::pipeline::storage::DERIVED_COLUMNS;

pub const ORDER_ID: &str = "OrderId";
pub const QUANTITY_ORDERED: &str = "QuantityOrdered";
pub const ITEM_PRICE: &str = "ItemPrice";
pub const PROMOTION_DISCOUNT: &str = "PromotionDiscount";

pub const REQUIRED_COLUMNS: [&str; 4] = [ORDER_ID, QUANTITY_ORDERED, ITEM_PRICE, PROMOTION_DISCOUNT];

/// Column indices resolved from a header row
struct Layout {
    order_id: usize,
    quantity_ordered: usize,
    item_price: usize,
    promotion_discount: usize,
    extra: Vec<(usize, String)>,
}

impl Layout {
    fn resolve(headers: &StringRecord, input: &str) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| LedgerError::MissingColumn {
                    input: input.to_string(),
                    column: column.to_string(),
                })
        };

        let order_id = find(ORDER_ID)?;
        let quantity_ordered = find(QUANTITY_ORDERED)?;
        let item_price = find(ITEM_PRICE)?;
        let promotion_discount = find(PROMOTION_DISCOUNT)?;

        // Derived columns are recomputed downstream, and a repeated header
        // keeps its first occurrence only.
        let mut extra: Vec<(usize, String)> = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            if REQUIRED_COLUMNS.contains(&name) || DERIVED_COLUMNS.contains(&name) {
                continue;
            }
            if extra.iter().any(|(_, seen)| seen == name) {
                continue;
            }
            extra.push((idx, name.to_string()));
        }

        Ok(Self {
            order_id,
            quantity_ordered,
            item_price,
            promotion_discount,
            extra,
        })
    }
}

/// Reads one region's order file, tagging every row with `region`.
pub fn read_region<P: AsRef<Path>>(path: P, region: Region, delimiter: u8) -> Result<Vec<TaggedOrder>> {
    let path = path.as_ref();
    let input = path.display().to_string();
    let file = File::open(path).map_err(|source| LedgerError::Open {
        path: input.clone(),
        source,
    })?;

    let orders = read_region_from(file, &input, region, delimiter)?;
    info!(region = %region, rows = orders.len(), input = %input, "Read region orders");
    Ok(orders)
}

/// Reads delimited order rows from any reader. `input` names the source in errors.
pub fn read_region_from<R: Read>(reader: R, input: &str, region: Region, delimiter: u8) -> Result<Vec<TaggedOrder>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = Layout::resolve(&headers, input)?;
    debug!(input = %input, extra_columns = layout.extra.len(), "Resolved column layout");

    let mut orders = Vec::new();
    for (position, row) in rdr.records().enumerate() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let order_id = match cell(layout.order_id) {
            "" => None,
            id => Some(id.to_string()),
        };
        let record = RawOrderRecord {
            order_id,
            quantity_ordered: parse_quantity(cell(layout.quantity_ordered), QUANTITY_ORDERED, input, line)?,
            item_price: parse_amount(cell(layout.item_price), ITEM_PRICE, input, line)?,
            promotion_discount: parse_amount(cell(layout.promotion_discount), PROMOTION_DISCOUNT, input, line)?,
            extra: layout
                .extra
                .iter()
                .map(|(idx, name)| (name.clone(), cell(*idx).to_string()))
                .collect(),
        };
        orders.push(TaggedOrder::new(region, position, record));
    }

    Ok(orders)
}

fn parse_number<T: FromStr>(value: &str, column: &str, input: &str, line: u64) -> Result<T> {
    value.parse::<T>().map_err(|_| LedgerError::InvalidNumber {
        input: input.to_string(),
        line,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Whole-number quantities may be written as floats (`2.0`), as dataframe
/// exports do for integer columns with gaps. Fractional values are rejected.
fn parse_quantity(value: &str, column: &str, input: &str, line: u64) -> Result<i64> {
    if let Ok(quantity) = value.parse::<i64>() {
        return Ok(quantity);
    }
    let amount = parse_amount(value, column, input, line)?;
    if amount.fract() != 0.0 || amount < i64::MIN as f64 || amount >= i64::MAX as f64 {
        return Err(LedgerError::InvalidNumber {
            input: input.to_string(),
            line,
            column: column.to_string(),
            value: value.to_string(),
        });
    }
    Ok(amount as i64)
}

fn parse_amount(value: &str, column: &str, input: &str, line: u64) -> Result<f64> {
    let amount: f64 = parse_number(value, column, input, line)?;
    if !amount.is_finite() {
        return Err(LedgerError::InvalidNumber {
            input: input.to_string(),
            line,
            column: column.to_string(),
            value: value.to_string(),
        });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn read(csv: &str, region: Region) -> Result<Vec<TaggedOrder>> {
        read_region_from(csv.as_bytes(), "test.csv", region, b',')
    }

    #[test]
    fn tags_every_row_with_its_region_and_position() {
        let orders = read(
            "OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,2,10.0,5\n2,1,3.5,0\n",
            Region::B,
        )
        .unwrap();

        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.region == Region::B));
        assert_eq!(orders[0].position, 0);
        assert_eq!(orders[1].position, 1);
        assert_eq!(orders[1].record, RawOrderRecord::new("2", 1, 3.5, 0.0));
    }

    #[test]
    fn columns_may_appear_in_any_order_with_extras() {
        let orders = read(
            "ProductName, ItemPrice ,OrderId,PromotionDiscount,QuantityOrdered,net_sale\nWidget,4,17,1,3,999\n",
            Region::A,
        )
        .unwrap();

        let record = &orders[0].record;
        assert_eq!(record.order_id.as_deref(), Some("17"));
        assert_eq!(record.quantity_ordered, 3);
        assert_eq!(record.item_price, 4.0);
        assert_eq!(record.promotion_discount, 1.0);
        assert_eq!(record.extra, vec![("ProductName".to_string(), "Widget".to_string())]);
    }

    #[test]
    fn empty_order_id_is_read_as_null() {
        let orders = read("OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n,1,1,0\n", Region::A).unwrap();
        assert_eq!(orders[0].record.order_id, None);
    }

    #[test]
    fn header_only_file_yields_no_rows() {
        let orders = read("OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n", Region::A).unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let err = read("OrderId,QuantityOrdered,ItemPrice\n1,1,1\n", Region::A).unwrap_err();
        assert!(matches!(err, LedgerError::MissingColumn { ref column, .. } if column == PROMOTION_DISCOUNT));
    }

    #[test]
    fn non_numeric_price_is_reported_with_line() {
        let err = read(
            "OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,1,1,0\n2,1,abc,0\n",
            Region::A,
        )
        .unwrap_err();
        match err {
            LedgerError::InvalidNumber { line, column, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, ITEM_PRICE);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        let err = read("OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,1,NaN,0\n", Region::A).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidNumber { .. }));
    }

    #[test]
    fn missing_quantity_is_reported() {
        let err = read("OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,,2,0\n", Region::A).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidNumber { ref column, .. } if column == QUANTITY_ORDERED));
    }

    #[test]
    fn whole_number_quantity_written_as_float_is_accepted() {
        let orders = read("OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,2.0,10,5\n", Region::A).unwrap();
        assert_eq!(orders[0].record.quantity_ordered, 2);
    }

    #[test]
    fn fractional_or_text_quantity_is_rejected() {
        for quantity in ["2.5", "two", "inf"] {
            let csv = format!("OrderId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,{quantity},10,5\n");
            let err = read(&csv, Region::A).unwrap_err();
            assert!(
                matches!(err, LedgerError::InvalidNumber { ref column, ref value, .. } if column == QUANTITY_ORDERED && value == quantity),
                "{quantity}: {err}"
            );
        }
    }

    #[test]
    fn reads_from_disk_with_custom_delimiter() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "OrderId;QuantityOrdered;ItemPrice;PromotionDiscount")?;
        writeln!(file, "9;2;1.25;0.5")?;

        let orders = read_region(file.path(), Region::A, b';')?;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].record.item_price, 1.25);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = read_region("/no/such/orders.csv", Region::A, b',').unwrap_err();
        assert!(matches!(err, LedgerError::Open { .. }));
    }
}
