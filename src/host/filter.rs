//! Read-path filtering of cached rows.
//!
//! The index keeps whole rows cached; a query only wants the cells its
//! filter selects, in the filter's direction, minus tombstones that are
//! past GC grace.

use std::cmp::Ordering;
use std::fmt;

use crate::types::row::{Cell, ColumnFamily};
use crate::types::schema::ColumnFamilySchema;
use crate::types::validator::Validator;

/// Host-side cell selection.
pub trait CellFilter: Send + Sync + fmt::Debug {
    fn is_reversed(&self) -> bool;

    /// Maximum number of live cells to collate.
    fn count(&self) -> usize {
        usize::MAX
    }

    fn selects(&self, comparator: &Validator, name: &[u8]) -> bool;
}

/// Inclusive range of cell names. An empty bound is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Vec<u8>,
    pub finish: Vec<u8>,
}

impl Slice {
    pub fn new(start: Vec<u8>, finish: Vec<u8>) -> Self {
        Self { start, finish }
    }

    pub fn contains(&self, comparator: &Validator, name: &[u8]) -> bool {
        let after_start =
            self.start.is_empty() || comparator.compare(name, &self.start) != Ordering::Less;
        let before_finish =
            self.finish.is_empty() || comparator.compare(name, &self.finish) != Ordering::Greater;
        after_start && before_finish
    }
}

/// Cells inside any of `slices`, bounds given in comparator order.
#[derive(Debug, Clone)]
pub struct SliceFilter {
    pub slices: Vec<Slice>,
    pub reversed: bool,
    pub count: usize,
}

impl SliceFilter {
    pub fn new(slices: Vec<Slice>, reversed: bool, count: usize) -> Self {
        Self {
            slices,
            reversed,
            count,
        }
    }

    /// Every cell, forward, unlimited.
    pub fn all() -> Self {
        Self::new(vec![Slice::default()], false, usize::MAX)
    }
}

impl CellFilter for SliceFilter {
    fn is_reversed(&self) -> bool {
        self.reversed
    }

    fn count(&self) -> usize {
        self.count
    }

    fn selects(&self, comparator: &Validator, name: &[u8]) -> bool {
        self.slices.iter().any(|s| s.contains(comparator, name))
    }
}

/// Cells with exactly these names.
#[derive(Debug, Clone)]
pub struct NamesFilter {
    pub names: Vec<Vec<u8>>,
}

impl NamesFilter {
    pub fn new(names: Vec<Vec<u8>>) -> Self {
        Self { names }
    }
}

impl CellFilter for NamesFilter {
    fn is_reversed(&self) -> bool {
        false
    }

    fn selects(&self, comparator: &Validator, name: &[u8]) -> bool {
        self.names
            .iter()
            .any(|n| comparator.compare(n, name) == Ordering::Equal)
    }
}

/// A host query against one partition.
#[derive(Debug)]
pub struct QueryFilter {
    pub key: Vec<u8>,
    pub filter: Box<dyn CellFilter>,
    /// Query time in milliseconds since epoch.
    pub timestamp: i64,
}

impl QueryFilter {
    pub fn new(key: Vec<u8>, filter: Box<dyn CellFilter>, timestamp: i64) -> Self {
        Self {
            key,
            filter,
            timestamp,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.filter.is_reversed()
    }
}

/// Tombstones deleted before this second may be purged.
///
/// Seconds are truncated to `i32` and the grace is subtracted with wrapping
/// arithmetic, matching the host's deletion-time encoding past 2038.
pub fn gc_before(schema: &ColumnFamilySchema, now_ms: i64) -> i32 {
    ((now_ms / 1000) as i32).wrapping_sub(schema.gc_grace_seconds())
}

/// Apply `filter` to a cached column family.
///
/// Returns a shallow clone of `cached` (reversed like the filter) holding
/// the selected cells up to the filter's live-cell count, with purgeable
/// tombstones and cells shadowed by a partition deletion removed. The result
/// is owned by the caller and not shared.
pub fn filter_column_family(
    schema: &ColumnFamilySchema,
    cached: &ColumnFamily,
    filter: &QueryFilter,
) -> ColumnFamily {
    let mut cf = cached.clone_shallow(filter.is_reversed());
    let gc_before = gc_before(schema, filter.timestamp);
    collate(&mut cf, cached, filter.filter.as_ref(), gc_before);
    remove_deleted(&mut cf, gc_before);
    cf
}

fn collate(out: &mut ColumnFamily, source: &ColumnFamily, filter: &dyn CellFilter, gc_before: i32) {
    let comparator = source.comparator();
    let deletion = source.deletion();
    let limit = filter.count();
    let mut live = 0usize;

    let cells: Box<dyn Iterator<Item = &Cell> + '_> = if filter.is_reversed() {
        Box::new(source.sorted_cells().iter().rev())
    } else {
        Box::new(source.sorted_cells().iter())
    };
    for cell in cells {
        if live >= limit {
            break;
        }
        if !filter.selects(comparator, &cell.name) || cell.is_gcable(gc_before) {
            continue;
        }
        // shadowed by the partition deletion: neither returned nor counted
        if deletion.is_some_and(|d| cell.timestamp <= d.marked_for_delete_at) {
            continue;
        }
        if cell.is_live() {
            live += 1;
        }
        out.add(cell.clone());
    }
}

fn remove_deleted(cf: &mut ColumnFamily, gc_before: i32) {
    let deletion = cf.deletion();
    cf.retain(|cell| {
        if cell.is_gcable(gc_before) {
            return false;
        }
        match deletion {
            Some(d) => cell.timestamp > d.marked_for_delete_at,
            None => true,
        }
    });
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::composite::{self, CompositeBuilder};
    use crate::types::row::DeletionTime;

    fn schema(gc_grace: i32) -> ColumnFamilySchema {
        ColumnFamilySchema::builder("ks", "mp")
            .partition_key("user", "text".parse().unwrap())
            .clustering_key("event_time", "int".parse().unwrap())
            .regular("event_type", "text".parse().unwrap())
            .gc_grace_seconds(gc_grace)
            .build()
    }

    fn name(ck: i32) -> Vec<u8> {
        composite::build([ck.to_be_bytes().as_slice(), b"event_type"]).unwrap()
    }

    fn cached(schema: &ColumnFamilySchema) -> ColumnFamily {
        let mut cf = ColumnFamily::new(schema);
        for ck in 1..=5 {
            cf.add(Cell::live(name(ck), vec![ck as u8], 10));
        }
        cf
    }

    fn values(cf: &ColumnFamily) -> Vec<u8> {
        cf.iter_in_query_order().map(|c| c.value[0]).collect()
    }

    #[test]
    fn test_gc_before() {
        assert_eq!(gc_before(&schema(864_000), 1_700_000_000_000), 1_699_136_000);
        assert_eq!(gc_before(&schema(0), 1_999), 1);
    }

    #[test]
    fn test_gc_before_wraps_past_i32_seconds() {
        // 2^31 s truncates to i32::MIN
        assert_eq!(gc_before(&schema(0), 2_147_483_648_000), i32::MIN);
        assert_eq!(gc_before(&schema(864_000), 2_147_483_648_000), i32::MIN.wrapping_sub(864_000));
        assert_eq!(gc_before(&schema(864_000), 2_147_483_647_999), i32::MAX - 864_000);
    }

    #[test]
    fn test_slice_bounds_and_reversal() {
        let s = schema(864_000);
        let mut start = CompositeBuilder::new();
        start.add(&2i32.to_be_bytes());
        let mut finish = CompositeBuilder::new();
        finish.add(&4i32.to_be_bytes());
        let slice = Slice::new(start.build_as_start_of_range().unwrap(), finish.build_as_end_of_range().unwrap());

        let forward = QueryFilter::new(b"u".to_vec(), Box::new(SliceFilter::new(vec![slice.clone()], false, 100)), 0);
        let cf = filter_column_family(&s, &cached(&s), &forward);
        assert_eq!(values(&cf), vec![2, 3, 4]);
        assert!(!cf.is_reversed());

        let reversed = QueryFilter::new(b"u".to_vec(), Box::new(SliceFilter::new(vec![slice], true, 2)), 0);
        let cf = filter_column_family(&s, &cached(&s), &reversed);
        assert!(cf.is_reversed());
        assert_eq!(values(&cf), vec![4, 3]);
    }

    #[test]
    fn test_names_filter() {
        let s = schema(864_000);
        let filter = QueryFilter::new(b"u".to_vec(), Box::new(NamesFilter::new(vec![name(1), name(5)])), 0);
        assert_eq!(values(&filter_column_family(&s, &cached(&s), &filter)), vec![1, 5]);
    }

    #[test]
    fn test_tombstones_past_grace_removed() {
        let s = schema(100);
        let mut cf = cached(&s);
        cf.add(Cell::tombstone(name(2), 20, 1_000));
        cf.add(Cell::tombstone(name(3), 20, 5_000));

        // now = 2_000s, gc_before = 1_900: the first tombstone is purgeable.
        let filter = QueryFilter::new(b"u".to_vec(), Box::new(SliceFilter::all()), 2_000_000);
        let out = filter_column_family(&s, &cf, &filter);
        assert_eq!(out.len(), 4);
        assert!(out.sorted_cells().iter().all(|c| c.name != name(2)));
        assert!(out.sorted_cells().iter().any(|c| !c.is_live()));
    }

    #[test]
    fn test_partition_deletion_shadows_older_cells() {
        let s = schema(864_000);
        let mut cf = cached(&s);
        cf.add(Cell::live(name(6), vec![6], 50));
        cf.delete(DeletionTime { marked_for_delete_at: 10, local_deletion_time: 1 });

        let filter = QueryFilter::new(b"u".to_vec(), Box::new(SliceFilter::all()), 0);
        let out = filter_column_family(&s, &cf, &filter);
        assert_eq!(values(&out), vec![6]);
        assert_eq!(out.deletion(), cf.deletion());
    }

    #[test]
    fn test_shadowed_cells_do_not_use_up_the_count() {
        let s = schema(864_000);
        let mut cf = ColumnFamily::new(&s);
        for ck in 1..=3 {
            cf.add(Cell::live(name(ck), vec![ck as u8], 5));
        }
        for ck in 4..=6 {
            cf.add(Cell::live(name(ck), vec![ck as u8], 50));
        }
        cf.delete(DeletionTime { marked_for_delete_at: 10, local_deletion_time: 1 });

        let filter = QueryFilter::new(b"u".to_vec(), Box::new(SliceFilter::new(vec![Slice::default()], false, 2)), 0);
        let out = filter_column_family(&s, &cf, &filter);
        assert_eq!(out.live_count(), 2);
        assert_eq!(values(&out), vec![4, 5]);
    }
}
