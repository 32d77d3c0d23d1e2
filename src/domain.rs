use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Source region of an order.
///
/// The derived ordering is the merge precedence: when two regions carry the
/// same `OrderId`, the record from the lower region (A) is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    A,
    B,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::A, Region::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::A => "A",
            Region::B => "B",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Region::A),
            "B" => Ok(Region::B),
            other => Err(LedgerError::UnknownRegion(other.to_string())),
        }
    }
}

/// One row of a regional order file, before any derived values exist.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOrderRecord {
    /// `None` when the source cell is empty
    pub order_id: Option<String>,
    pub quantity_ordered: i64,
    pub item_price: f64,
    pub promotion_discount: f64,
    /// Any further source columns, carried through to the ledger untouched
    pub extra: Vec<(String, String)>,
}

impl RawOrderRecord {
    pub fn new(order_id: impl Into<String>, quantity_ordered: i64, item_price: f64, promotion_discount: f64) -> Self {
        Self {
            order_id: Some(order_id.into()),
            quantity_ordered,
            item_price,
            promotion_discount,
            extra: Vec::new(),
        }
    }
}

/// A raw record with its region and source row position attached at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedOrder {
    pub region: Region,
    /// Zero-based row index within the region's source
    pub position: usize,
    pub record: RawOrderRecord,
}

impl TaggedOrder {
    pub fn new(region: Region, position: usize, record: RawOrderRecord) -> Self {
        Self { region, position, record }
    }

    /// Sort key deciding which record survives an `OrderId` collision:
    /// region precedence first, then original file order.
    pub fn precedence(&self) -> (Region, usize) {
        (self.region, self.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedOrderRecord {
    pub region: Region,
    pub position: usize,
    pub record: RawOrderRecord,
    pub total_sales: f64,
    pub net_sale: f64,
}

impl MergedOrderRecord {
    /// `total_sales = QuantityOrdered * ItemPrice`, `net_sale = total_sales - PromotionDiscount`.
    pub fn derive(order: TaggedOrder) -> Self {
        let total_sales = order.record.quantity_ordered as f64 * order.record.item_price;
        let net_sale = total_sales - order.record.promotion_discount;
        Self {
            region: order.region,
            position: order.position,
            record: order.record,
            total_sales,
            net_sale,
        }
    }

    pub fn order_id(&self) -> Option<&str> {
        self.record.order_id.as_deref()
    }
}

impl From<MergedOrderRecord> for TaggedOrder {
    fn from(merged: MergedOrderRecord) -> Self {
        TaggedOrder::new(merged.region, merged.position, merged.record)
    }
}
