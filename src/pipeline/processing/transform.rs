//! Merging regional orders into one deduplicated, positive-net-sale ledger.
//!
//! The merge runs in a fixed order: combine, derive sales fields, deduplicate
//! on `OrderId`, then drop non-positive net sales. Deduplication keeps the
//! record with the lowest [`TaggedOrder::precedence`], so region A wins over
//! region B and earlier rows win within a region, independent of the order in
//! which the inputs are handed over.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::{MergedOrderRecord, RawOrderRecord, Region, TaggedOrder};

/// Row counts observed while merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub rows_in: usize,
    pub duplicates_dropped: usize,
    pub non_positive_dropped: usize,
    pub rows_out: usize,
}

/// Attaches `region` and the row position to each record, in iteration order.
pub fn tag<I>(region: Region, records: I) -> Vec<TaggedOrder>
where
    I: IntoIterator<Item = RawOrderRecord>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(position, record)| TaggedOrder::new(region, position, record))
        .collect()
}

/// Merges two regional batches into the ledger.
///
/// Each argument must hold the records of one region, tagged by [`tag`] or
/// the reader, and the two must be different regions. Argument order does
/// not matter; the tags decide precedence. Debug builds assert this.
pub fn merge<A, B>(region_a: A, region_b: B) -> Vec<MergedOrderRecord>
where
    A: IntoIterator<Item = TaggedOrder>,
    B: IntoIterator<Item = TaggedOrder>,
{
    merge_with_stats(region_a, region_b).0
}

pub fn merge_with_stats<A, B>(region_a: A, region_b: B) -> (Vec<MergedOrderRecord>, MergeStats)
where
    A: IntoIterator<Item = TaggedOrder>,
    B: IntoIterator<Item = TaggedOrder>,
{
    let region_a: Vec<TaggedOrder> = region_a.into_iter().collect();
    let region_b: Vec<TaggedOrder> = region_b.into_iter().collect();
    debug_assert!(
        distinct_single_regions(&region_a, &region_b),
        "merge expects each input to hold a single region, and the two regions to differ"
    );

    let mut combined: Vec<TaggedOrder> = region_a.into_iter().chain(region_b).collect();
    // Stable, so equal keys keep their input order
    combined.sort_by_key(TaggedOrder::precedence);
    let rows_in = combined.len();

    let derived = derive_all(combined);

    let unique = dedup_first_wins(derived);
    let duplicates_dropped = rows_in - unique.len();

    let positive = retain_positive(unique);
    let non_positive_dropped = rows_in - duplicates_dropped - positive.len();

    let stats = MergeStats {
        rows_in,
        duplicates_dropped,
        non_positive_dropped,
        rows_out: positive.len(),
    };
    debug!(?stats, "Merged regional orders");
    (positive, stats)
}

fn distinct_single_regions(first: &[TaggedOrder], second: &[TaggedOrder]) -> bool {
    let single = |orders: &[TaggedOrder]| match orders.first() {
        Some(head) => orders.iter().all(|o| o.region == head.region).then_some(Some(head.region)),
        None => Some(None),
    };
    match (single(first), single(second)) {
        (Some(Some(a)), Some(Some(b))) => a != b,
        (Some(_), Some(_)) => true,
        _ => false,
    }
}

pub fn derive_all<I>(orders: I) -> Vec<MergedOrderRecord>
where
    I: IntoIterator<Item = TaggedOrder>,
{
    orders.into_iter().map(MergedOrderRecord::derive).collect()
}

/// Keeps the first record seen for each `OrderId`. Null ids count as one key.
pub fn dedup_first_wins(records: Vec<MergedOrderRecord>) -> Vec<MergedOrderRecord> {
    let mut seen: HashSet<Option<String>> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.record.order_id.clone()))
        .collect()
}

pub fn retain_positive(records: Vec<MergedOrderRecord>) -> Vec<MergedOrderRecord> {
    records.into_iter().filter(|r| r.net_sale > 0.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, qty: i64, price: f64, discount: f64) -> RawOrderRecord {
        RawOrderRecord::new(id, qty, price, discount)
    }

    #[test]
    fn region_a_wins_and_non_positive_rows_are_dropped() {
        let region_a = tag(Region::A, vec![order("1", 2, 10.0, 5.0)]);
        let region_b = tag(Region::B, vec![order("1", 1, 3.0, 0.0), order("2", 1, -5.0, 0.0)]);

        let (merged, stats) = merge_with_stats(region_a, region_b);

        assert_eq!(merged.len(), 1);
        let only = &merged[0];
        assert_eq!(only.order_id(), Some("1"));
        assert_eq!(only.region, Region::A);
        assert_eq!(only.total_sales, 20.0);
        assert_eq!(only.net_sale, 15.0);
        assert_eq!(
            stats,
            MergeStats {
                rows_in: 3,
                duplicates_dropped: 1,
                non_positive_dropped: 1,
                rows_out: 1
            }
        );
    }

    #[test]
    fn empty_inputs_merge_to_nothing() {
        let merged = merge(Vec::<TaggedOrder>::new(), Vec::<TaggedOrder>::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn one_empty_region_still_tags_the_other() {
        let merged = merge(Vec::<TaggedOrder>::new(), tag(Region::B, vec![order("1", 1, 2.0, 0.0), order("2", 1, 2.0, 0.0)]));
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|r| r.region == Region::B));
    }

    #[test]
    fn tag_counts_match_input_lengths() {
        let region_a = tag(Region::A, vec![order("1", 1, 1.0, 0.0), order("1", 1, 1.0, 0.0)]);
        let region_b = tag(Region::B, vec![order("2", 1, 1.0, 0.0); 3]);

        let derived = derive_all(region_a.into_iter().chain(region_b));
        assert_eq!(derived.iter().filter(|r| r.region == Region::A).count(), 2);
        assert_eq!(derived.iter().filter(|r| r.region == Region::B).count(), 3);
    }

    #[test]
    fn precedence_holds_when_inputs_are_swapped() {
        let region_a = tag(Region::A, vec![order("1", 1, 100.0, 0.0)]);
        let region_b = tag(Region::B, vec![order("1", 1, 1.0, 0.0)]);

        // Hand the B rows over first; A must still win.
        let merged = merge(region_b, region_a);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].region, Region::A);
        assert_eq!(merged[0].total_sales, 100.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "single region")]
    fn two_batches_of_the_same_region_are_refused() {
        merge(
            tag(Region::B, vec![order("1", 1, 1.0, 0.0)]),
            tag(Region::B, vec![order("2", 1, 1.0, 0.0)]),
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "single region")]
    fn mixed_region_batch_is_refused() {
        let mut mixed = tag(Region::A, vec![order("1", 1, 1.0, 0.0), order("2", 1, 1.0, 0.0)]);
        mixed[1].region = Region::B;
        merge(mixed, Vec::<TaggedOrder>::new());
    }

    #[test]
    fn earlier_row_wins_within_a_region() {
        let merged = merge(
            tag(Region::A, vec![order("5", 1, 1.0, 0.0), order("5", 1, 9.0, 0.0)]),
            Vec::<TaggedOrder>::new(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].total_sales, 1.0);
        assert_eq!(merged[0].position, 0);
    }

    #[test]
    fn dedup_runs_before_the_positivity_filter() {
        // The first occurrence has a non-positive net sale; the later one is
        // discarded as a duplicate before filtering, so the id disappears.
        let merged = merge(
            tag(Region::A, vec![order("1", 1, 5.0, 5.0)]),
            tag(Region::B, vec![order("1", 1, 50.0, 0.0)]),
        );
        assert!(merged.is_empty());
    }

    #[test]
    fn null_order_ids_collapse_to_one() {
        let mut first = order("x", 1, 1.0, 0.0);
        first.order_id = None;
        let mut second = first.clone();
        second.item_price = 2.0;

        let merged = merge(tag(Region::A, vec![first]), tag(Region::B, vec![second]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].region, Region::A);
    }

    #[test]
    fn zero_net_sale_is_dropped() {
        let merged = merge(tag(Region::A, vec![order("1", 2, 5.0, 10.0)]), Vec::<TaggedOrder>::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn output_keeps_region_then_file_order() {
        let merged = merge(
            tag(Region::A, vec![order("3", 1, 1.0, 0.0), order("1", 1, 1.0, 0.0)]),
            tag(Region::B, vec![order("2", 1, 1.0, 0.0)]),
        );
        let ids: Vec<_> = merged.iter().map(|r| r.order_id().unwrap()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn merging_a_clean_ledger_again_is_a_no_op() {
        let merged = merge(
            tag(Region::A, vec![order("1", 2, 3.0, 1.0), order("2", 1, 4.0, 0.0)]),
            tag(Region::B, vec![order("3", 5, 1.0, 0.5)]),
        );

        let (again_a, again_b): (Vec<TaggedOrder>, Vec<TaggedOrder>) = merged
            .iter()
            .cloned()
            .map(TaggedOrder::from)
            .partition(|o| o.region == Region::A);
        let remerged = merge(again_a, again_b);

        assert_eq!(remerged, merged);
    }

    #[test]
    fn output_satisfies_uniqueness_and_positivity() {
        let region_a = tag(
            Region::A,
            (0..20).map(|i| order(&(i % 7).to_string(), i % 3, 2.0, (i % 4) as f64)),
        );
        let region_b = tag(
            Region::B,
            (0..20).map(|i| order(&(i % 11).to_string(), 1, (i as f64) - 5.0, 0.0)),
        );

        let merged = merge(region_a, region_b);
        let ids: HashSet<_> = merged.iter().map(|r| r.order_id()).collect();
        assert_eq!(ids.len(), merged.len());
        assert!(merged.iter().all(|r| r.net_sale > 0.0));
        for r in &merged {
            assert_eq!(r.total_sales, r.record.quantity_ordered as f64 * r.record.item_price);
            assert_eq!(r.net_sale, r.total_sales - r.record.promotion_discount);
        }
    }
}
