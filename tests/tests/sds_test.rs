use packed_collections::Sds;

#[test]
fn clear_is_lazy_and_preserves_capacity_for_reuse() {
    let mut s = Sds::new_from_bytes(b"hello world").unwrap();
    let avail_before = s.avail();
    s.clear();
    assert_eq!(s.len(), 0);
    assert!(s.avail() >= avail_before + 11);
    assert!(s.cat(b"reused"));
    assert_eq!(s.as_bytes(), b"reused");
}

#[test]
fn sub_range_handles_negative_indices_like_a_python_slice() {
    let mut s = Sds::new_from_bytes(b"0123456789").unwrap();
    s.sub_range(-3, -1);
    assert_eq!(s.as_bytes(), b"789");
}

#[test]
fn trim_strips_only_the_requested_byte_set() {
    let mut s = Sds::new_from_bytes(b"  padded--").unwrap();
    s.trim(b" -");
    assert_eq!(s.as_bytes(), b"padded");
}

#[test]
fn reserve_then_cat_never_reallocates_below_the_reserved_amount() {
    let mut s = Sds::empty().unwrap();
    assert!(s.reserve(1000));
    let cap = s.avail();
    assert!(s.cat(b"small"));
    assert_eq!(s.avail(), cap - 5);
}
