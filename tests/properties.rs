//! Property tests for composite names, GC boundaries and TIMEUUID rendering.

use std::cmp::Ordering;

use proptest::prelude::*;
use sgindex::codec::composite::{self, CompositeBuilder};
use sgindex::host::gc_before;
use sgindex::types::value::time_ordered_string;
use sgindex::types::{Cell, ColumnFamilySchema, Validator};
use uuid::Uuid;

fn schema(gc_grace: i32) -> ColumnFamilySchema {
    ColumnFamilySchema::builder("ks", "t")
        .partition_key("user", "text".parse().unwrap())
        .gc_grace_seconds(gc_grace)
        .build()
}

/// Version-1 UUID carrying a 60-bit timestamp.
fn timeuuid(ts: u64, clock_seq: u16, node: [u8; 6]) -> Uuid {
    let time_low = (ts & 0xffff_ffff) as u32;
    let time_mid = ((ts >> 32) & 0xffff) as u16;
    let time_hi = ((ts >> 48) & 0x0fff) as u16 | 0x1000;
    let seq = (clock_seq & 0x3fff) | 0x8000;
    let mut d4 = [0u8; 8];
    d4[..2].copy_from_slice(&seq.to_be_bytes());
    d4[2..].copy_from_slice(&node);
    Uuid::from_fields(time_low, time_mid, time_hi, &d4)
}

proptest! {
    #[test]
    fn composite_split_returns_components(
        parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..6)
    ) {
        let bytes = composite::build(parts.iter().map(Vec::as_slice)).unwrap();
        let split = composite::split(&bytes).unwrap();
        prop_assert_eq!(split.len(), parts.len());
        for (a, b) in split.iter().zip(&parts) {
            prop_assert_eq!(*a, b.as_slice());
        }
    }

    #[test]
    fn composite_order_follows_component_type(a in any::<i32>(), b in any::<i32>()) {
        let int: Validator = "int".parse().unwrap();
        let ca = composite::build([a.to_be_bytes().as_slice()]).unwrap();
        let cb = composite::build([b.to_be_bytes().as_slice()]).unwrap();
        prop_assert_eq!(composite::compare(&[int], &ca, &cb), a.cmp(&b));
    }

    #[test]
    fn range_bounds_enclose_prefix(prefix in any::<i32>(), suffix in prop::collection::vec(any::<u8>(), 1..20)) {
        let int: Validator = "int".parse().unwrap();
        let blob: Validator = "blob".parse().unwrap();
        let types = [int, blob];

        let mut bound = CompositeBuilder::new();
        bound.add(&prefix.to_be_bytes());
        let name = composite::build([prefix.to_be_bytes().as_slice(), suffix.as_slice()]).unwrap();

        prop_assert_eq!(composite::compare(&types, &bound.build_as_start_of_range().unwrap(), &name), Ordering::Less);
        prop_assert_eq!(composite::compare(&types, &bound.build_as_end_of_range().unwrap(), &name), Ordering::Greater);
    }

    #[test]
    fn tombstones_purge_strictly_before_gc_boundary(
        now_s in 1_000_000i64..2_000_000_000,
        grace in 0i32..10_000_000,
        offset in -5i32..5,
    ) {
        let s = schema(grace);
        let boundary = gc_before(&s, now_s * 1000 + 999);
        prop_assert_eq!(boundary, now_s as i32 - grace);

        let deleted_at = boundary + offset;
        let tombstone = Cell::tombstone(b"c".to_vec(), 1, deleted_at);
        prop_assert_eq!(tombstone.is_gcable(boundary), offset < 0);
        prop_assert!(!Cell::live(b"c".to_vec(), Vec::new(), 1).is_gcable(boundary));
    }

    #[test]
    fn timeuuid_rendering_sorts_by_time(
        a in 0u64..(1 << 60),
        b in 0u64..(1 << 60),
        seq_a in any::<u16>(),
        seq_b in any::<u16>(),
        node in any::<[u8; 6]>(),
    ) {
        prop_assume!(a != b);
        let sa = time_ordered_string(&timeuuid(a, seq_a, node));
        let sb = time_ordered_string(&timeuuid(b, seq_b, node));
        prop_assert_eq!(sa.cmp(&sb), a.cmp(&b));
    }
}

#[test]
fn timeuuid_comparator_matches_rendering() {
    let timeuuid_type: Validator = "timeuuid".parse().unwrap();
    let early = timeuuid(0x0123_4567_89ab, 7, [1; 6]);
    let late = timeuuid(0x0fff_0000_0000_0001, 0, [0; 6]);
    assert_eq!(
        timeuuid_type.compare(early.as_bytes(), late.as_bytes()),
        Ordering::Less
    );
    assert!(time_ordered_string(&early) < time_ordered_string(&late));
}
