use std::fmt;

use super::validate::ValidationReport;

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total number of records: {}", self.total_records)?;

        writeln!(f, "Total sales amount by region:")?;
        for (region, total) in &self.sales_by_region {
            writeln!(f, "Region {}: {:.2}", region, total)?;
        }

        match self.average_net_sale {
            Some(average) => writeln!(f, "Average sales amount per transaction: {:.2}", average)?,
            None => writeln!(f, "Average sales amount per transaction: undefined (no records)")?,
        }

        if self.no_duplicate_order_ids {
            write!(f, "No duplicate OrderId values found.")
        } else {
            write!(
                f,
                "Duplicate OrderId values found ({} distinct of {}).",
                self.distinct_order_ids, self.total_order_ids
            )
        }
    }
}
