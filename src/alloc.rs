//! Raw byte-region allocator shim consumed by `sds`, `intset` and `ziplist`.
//!
//! Uses `alloc`/`dealloc` straight from `std::alloc` with `NonNull` handles
//! and explicit `Layout` math, the same low-level approach a hand-rolled
//! hash table's bucket array allocation takes, simplified here to plain byte
//! regions since the containers in this crate manage their own internal
//! layout rather than an array of `T`.

use std::alloc::{alloc, dealloc, handle_alloc_error, realloc};
use std::ptr::NonNull;

/// A single heap allocation of raw bytes, aligned to `align_of::<usize>()`.
///
/// The blob remembers the `Layout` it was allocated with so it can free or
/// grow itself without the caller re-deriving alignment.
pub(crate) struct RawBlob {
    ptr: NonNull<u8>,
    len: usize,
}

const ALIGN: usize = std::mem::align_of::<usize>();

#[inline]
fn layout_for(len: usize) -> std::alloc::Layout {
    std::alloc::Layout::from_size_align(len.max(1), ALIGN).expect("capacity overflow")
}

impl RawBlob {
    /// Allocates a zero-initialized region of `len` bytes.
    ///
    /// Returns `None` on allocation failure rather than aborting, so callers
    /// can propagate a null handle the way the C container library does.
    pub(crate) fn new(len: usize) -> Option<Self> {
        let layout = layout_for(len);
        let ptr = unsafe { alloc(layout) };
        let ptr = NonNull::new(ptr)?;
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, len) };
        Some(Self { ptr, len })
    }

    /// Grows or shrinks the region in place, preserving the overlap.
    /// Newly added bytes (when growing) are left uninitialized.
    pub(crate) fn realloc(&mut self, new_len: usize) -> bool {
        let old_layout = layout_for(self.len);
        let new_ptr = unsafe { realloc(self.ptr.as_ptr(), old_layout, new_len.max(1)) };
        match NonNull::new(new_ptr) {
            Some(p) => {
                self.ptr = p;
                self.len = new_len;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for RawBlob {
    fn drop(&mut self) {
        let layout = layout_for(self.len);
        unsafe { dealloc(self.ptr.as_ptr(), layout) };
    }
}

/// Aborts the process the way `std::alloc::handle_alloc_error` does, for call
/// sites that have decided an allocation failure is unrecoverable.
#[cold]
pub(crate) fn abort_on_alloc_failure(len: usize) -> ! {
    handle_alloc_error(layout_for(len))
}
