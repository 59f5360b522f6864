use packed_collections::IntSet;

fn width_of(s: &IntSet) -> usize {
    assert!(s.length() > 0);
    (s.byte_size() - 8) / s.length()
}

/// Values that fit in 16 bits, then a value that forces promotion to 32
/// bits, then one that forces promotion all the way to 64 bits. Encoding
/// must never shrink back down afterward even though later adds fit in a
/// narrower width.
#[test]
fn promotes_through_every_width_and_never_demotes() {
    let mut s = IntSet::new().unwrap();
    s.add(1);
    assert_eq!(width_of(&s), 2);

    s.add(70_000); // past i16::MAX, forces 32-bit
    assert_eq!(width_of(&s), 4);

    s.add(10_000_000_000); // past i32::MAX, forces 64-bit
    assert_eq!(width_of(&s), 8);

    // Adding a value that would fit in 16 bits must not shrink the width.
    s.add(2);
    assert_eq!(width_of(&s), 8);

    let values: Vec<i64> = (0..s.length()).map(|i| s.get_by_index(i).unwrap()).collect();
    assert_eq!(values, vec![1, 2, 70_000, 10_000_000_000]);
}

#[test]
fn maintains_sorted_order_and_dedups_under_random_inserts() {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let mut s = IntSet::new().unwrap();
    let mut reference = std::collections::BTreeSet::new();
    for _ in 0..2000 {
        let v: i64 = rng.gen_range(-1_000_000i64, 1_000_000i64);
        s.add(v);
        reference.insert(v);
    }
    assert_eq!(s.length(), reference.len());
    let collected: Vec<i64> = (0..s.length()).map(|i| s.get_by_index(i).unwrap()).collect();
    let expected: Vec<i64> = reference.into_iter().collect();
    assert_eq!(collected, expected);
    for v in &collected {
        assert!(s.contains(*v));
    }
}

#[test]
fn remove_keeps_remaining_elements_sorted() {
    let mut s = IntSet::new().unwrap();
    for v in [5, 1, 9, 3, 7] {
        s.add(v);
    }
    assert!(s.remove(3));
    assert!(!s.remove(3));
    let collected: Vec<i64> = (0..s.length()).map(|i| s.get_by_index(i).unwrap()).collect();
    assert_eq!(collected, vec![1, 5, 7, 9]);
}
