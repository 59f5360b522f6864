use packed_collections::Dict;
use std::collections::HashSet;

/// Inserting enough keys to force several incremental-rehash cycles, then
/// driving rehashing to completion, must leave every key reachable and the
/// table back to a single, non-rehashing sub-table.
#[test]
fn rehash_correctness_under_a_ten_thousand_key_load() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..10_000i64 {
        assert!(d.add(i, i * 2));
    }
    assert_eq!(d.len(), 10_000);

    while d.is_rehashing() {
        d.rehash_n(64);
    }
    assert!(!d.is_rehashing());

    for i in 0..10_000i64 {
        assert_eq!(d.find(&i), Some(&(i * 2)));
    }
    assert_eq!(d.len(), 10_000);
}

/// Adding duplicate keys mid-rehash and deleting others must keep `len()`
/// and lookups consistent while entries are split across both sub-tables.
#[test]
fn mutations_stay_consistent_while_straddling_both_subtables() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..5_000i64 {
        d.add(i, i);
    }
    assert!(d.is_rehashing());

    assert!(!d.add(10, 999)); // already present, must be rejected
    assert!(d.delete(&10));
    assert!(d.find(&10).is_none());
    assert!(d.add(10, 999));
    assert_eq!(d.find(&10), Some(&999));

    while d.is_rehashing() {
        d.rehash_n(64);
    }
    assert_eq!(d.len(), 5_000);
}

/// A safe cursor taken while the table is actively rehashing must still
/// surface every live entry exactly once, spanning both sub-tables.
#[test]
fn safe_iterator_sees_every_entry_while_rehashing() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..3_000i64 {
        d.add(i, i);
    }
    assert!(d.is_rehashing());

    let mut cursor = d.iter();
    let mut seen = HashSet::new();
    while let Some((k, _)) = d.iter_next(&mut cursor) {
        seen.insert(*k);
    }
    d.iter_finish(cursor);
    assert_eq!(seen.len(), 3_000);
    for i in 0..3_000i64 {
        assert!(seen.contains(&i));
    }
}

/// Opening a safe cursor mid-rehash must suspend the rehash cursor for as
/// long as it stays open, even while 1000 inserts land in the meantime, and
/// rehashing must resume and complete normally once the cursor is closed.
#[test]
fn safe_iterator_suspends_rehashing_across_interleaved_inserts() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..2_000i64 {
        d.add(i, i);
    }
    assert!(d.is_rehashing());

    let cursor = d.iter();
    let cursor_pos = d.rehash_cursor();
    for i in 2_000..3_000i64 {
        d.add(i, i);
    }
    assert_eq!(d.rehash_cursor(), cursor_pos);
    assert!(d.is_rehashing());
    d.iter_finish(cursor);

    while d.is_rehashing() {
        d.rehash_n(64);
    }
    for i in 0..3_000i64 {
        assert_eq!(d.find(&i), Some(&i));
    }
}

/// A full scan cycle (cursor returns to zero) must visit every entry at
/// least once even though several resizes happen along the way.
#[test]
fn scan_covers_every_entry_across_growth() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..6_000i64 {
        d.add(i, i);
    }

    let mut seen = HashSet::new();
    let mut cursor = 0u64;
    loop {
        cursor = d.scan(cursor, |k, _| {
            seen.insert(*k);
        });
        if cursor == 0 {
            break;
        }
    }
    for i in 0..6_000i64 {
        assert!(seen.contains(&i));
    }
}

#[test]
fn add_or_find_inserts_once_and_returns_the_live_entry() {
    let mut d: Dict<&str, i32> = Dict::new();
    assert_eq!(*d.add_or_find("k", 1), 1);
    assert_eq!(*d.add_or_find("k", 999), 1); // already present, value untouched
    assert_eq!(d.find(&"k"), Some(&1));
    assert_eq!(d.len(), 1);
}

#[test]
fn resize_to_min_shrinks_after_bulk_removal_and_stays_correct() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..2_000i64 {
        d.add(i, i);
    }
    while d.is_rehashing() {
        d.rehash_n(64);
    }
    for i in 0..1_900i64 {
        d.delete(&i);
    }
    assert_eq!(d.len(), 100);
    assert!(d.resize_to_min());
    while d.is_rehashing() {
        d.rehash_n(64);
    }
    for i in 1_900..2_000i64 {
        assert_eq!(d.find(&i), Some(&i));
    }
}
