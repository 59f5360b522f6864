//! Sorted, deduplicated set of signed integers with on-demand width
//! promotion.
//!
//! Binary layout: `[encoding:u32][length:u32][elements...]`, each element
//! `encoding` bytes wide, little-endian, strictly ascending.

use crate::alloc::RawBlob;
use crate::endian::{read_i16, read_i32, read_i64, read_u32, write_i16, write_i32, write_i64, write_u32};
use rand::Rng;

const HEADER_LEN: usize = 8;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u32)]
pub enum Encoding {
    I16 = 2,
    I32 = 4,
    I64 = 8,
}

impl Encoding {
    #[inline]
    fn width(self) -> usize {
        self as u32 as usize
    }

    fn from_width(width: u32) -> Self {
        match width {
            2 => Encoding::I16,
            4 => Encoding::I32,
            8 => Encoding::I64,
            other => panic!("invalid intset encoding width {}", other),
        }
    }

    /// Smallest encoding able to hold `v`.
    fn required_for(v: i64) -> Self {
        if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
            Encoding::I16
        } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
            Encoding::I32
        } else {
            Encoding::I64
        }
    }
}

/// A sorted, deduplicated set of `i64` values, densely packed at the
/// narrowest width that fits every member.
pub struct IntSet {
    blob: RawBlob,
}

impl IntSet {
    /// Creates a new empty set encoded at the narrowest width (`I16`).
    pub fn new() -> Option<Self> {
        let blob = RawBlob::new(HEADER_LEN)?;
        let mut s = Self { blob };
        s.set_encoding(Encoding::I16);
        s.set_length(0);
        Some(s)
    }

    #[inline]
    fn encoding(&self) -> Encoding {
        Encoding::from_width(read_u32(&self.blob.as_slice()[0..4]))
    }

    #[inline]
    fn set_encoding(&mut self, enc: Encoding) {
        write_u32(&mut self.blob.as_mut_slice()[0..4], enc.width() as u32)
    }

    #[inline]
    pub fn length(&self) -> usize {
        read_u32(&self.blob.as_slice()[4..8]) as usize
    }

    #[inline]
    fn set_length(&mut self, len: usize) {
        write_u32(&mut self.blob.as_mut_slice()[4..8], len as u32)
    }

    #[inline]
    pub fn byte_size(&self) -> usize {
        self.blob.len()
    }

    fn elem_offset(&self, index: usize) -> usize {
        HEADER_LEN + index * self.encoding().width()
    }

    fn get_raw(&self, index: usize, enc: Encoding) -> i64 {
        let off = HEADER_LEN + index * enc.width();
        let buf = &self.blob.as_slice()[off..];
        match enc {
            Encoding::I16 => read_i16(buf) as i64,
            Encoding::I32 => read_i32(buf) as i64,
            Encoding::I64 => read_i64(buf),
        }
    }

    fn set_raw(&mut self, index: usize, value: i64, enc: Encoding) {
        let off = HEADER_LEN + index * enc.width();
        let buf = &mut self.blob.as_mut_slice()[off..];
        match enc {
            Encoding::I16 => write_i16(buf, value as i16),
            Encoding::I32 => write_i32(buf, value as i32),
            Encoding::I64 => write_i64(buf, value),
        }
    }

    /// Reads the value at the given index, or `None` if out of range.
    pub fn get_by_index(&self, index: usize) -> Option<i64> {
        if index >= self.length() {
            return None;
        }
        Some(self.get_raw(index, self.encoding()))
    }

    /// Binary search for `value` over the current-encoding view. Returns
    /// `Ok(index)` if present, `Err(insert_at)` otherwise.
    fn search(&self, value: i64) -> Result<usize, usize> {
        let enc = self.encoding();
        let len = self.length();
        let mut lo = 0usize;
        let mut hi = len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let v = self.get_raw(mid, enc);
            if v == value {
                return Ok(mid);
            } else if v < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Err(lo)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.search(value).is_ok()
    }

    /// Widens every element to `new_enc`, walking from the high-index end so
    /// in-place expansion never overlaps an element not yet moved.
    fn upgrade_and_add(&mut self, new_enc: Encoding, value: i64) -> bool {
        let old_enc = self.encoding();
        let len = self.length();
        let prepend = value < 0;

        let new_total = HEADER_LEN + (len + 1) * new_enc.width();
        // Read every old element before growing the allocation underneath us.
        let old_values: Vec<i64> = (0..len).map(|i| self.get_raw(i, old_enc)).collect();

        if !self.blob.realloc(new_total) {
            return false;
        }
        self.set_encoding(new_enc);
        self.set_length(len + 1);

        // Write back to front so growing element width never clobbers a
        // not-yet-relocated element.
        let dest_offset = if prepend { 1 } else { 0 };
        for (i, v) in old_values.iter().enumerate().rev() {
            self.set_raw(i + dest_offset, *v, new_enc);
        }

        if prepend {
            self.set_raw(0, value, new_enc);
        } else {
            self.set_raw(len, value, new_enc);
        }
        true
    }

    /// Inserts `value` if absent. Returns `(inserted)`; the set handle itself
    /// may have been reallocated in place, so always use the `&mut self`
    /// reference's subsequent state, not a stashed pointer.
    pub fn add(&mut self, value: i64) -> bool {
        let required = Encoding::required_for(value);
        let current = self.encoding();

        if required > current {
            return self.upgrade_and_add(required, value);
        }

        match self.search(value) {
            Ok(_) => false,
            Err(pos) => {
                let len = self.length();
                let width = current.width();
                let new_total = HEADER_LEN + (len + 1) * width;
                if !self.blob.realloc(new_total) {
                    return false;
                }
                self.set_length(len + 1);
                let from = HEADER_LEN + pos * width;
                let to = from + width;
                let move_len = (len - pos) * width;
                self.blob
                    .as_mut_slice()
                    .copy_within(from..from + move_len, to);
                self.set_raw(pos, value, current);
                true
            }
        }
    }

    /// Removes `value` if present, shrinking the allocation exactly.
    pub fn remove(&mut self, value: i64) -> bool {
        let enc = self.encoding();
        match self.search(value) {
            Err(_) => false,
            Ok(pos) => {
                let len = self.length();
                let width = enc.width();
                let from = HEADER_LEN + (pos + 1) * width;
                let to = HEADER_LEN + pos * width;
                let move_len = (len - pos - 1) * width;
                self.blob.as_mut_slice().copy_within(from..from + move_len, to);
                self.set_length(len - 1);
                let new_total = HEADER_LEN + (len - 1) * width;
                self.blob.realloc(new_total);
                true
            }
        }
    }

    /// Returns a uniformly random element, or `None` if empty.
    pub fn random(&self) -> Option<i64> {
        let len = self.length();
        if len == 0 {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0, len);
        self.get_by_index(idx)
    }

    #[allow(dead_code)]
    fn debug_offset(&self, index: usize) -> usize {
        self.elem_offset(index)
    }
}
