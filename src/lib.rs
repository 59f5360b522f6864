//! Compact, allocation-dense container core: a dynamic byte string, a
//! packed integer set, a relocatable sequence ziplist, and an
//! incrementally-rehashed hash table.

/// Crate-wide error type and `Result` alias.
pub mod error;

/// Raw byte-region allocator shim shared by the fixed-layout containers.
pub(crate) mod alloc;

/// Little/big-endian integer read/write helpers for on-disk layouts.
pub(crate) mod endian;

/// Strict byte-slice to `i64` parsing, shared by `ziplist` and `sds`.
pub mod util;

/// Dynamic byte string with an embedded length/free header.
pub mod sds;

/// Sorted, deduplicated set of signed integers with width promotion.
pub mod intset;

/// Compact doubly-traversable sequence encoded as a single allocation.
pub mod ziplist;

/// Incrementally-rehashed hash table with separate chaining.
pub mod dict;

pub use dict::Dict;
pub use error::{CollectionError, Result};
pub use intset::IntSet;
pub use sds::Sds;
pub use ziplist::{End, ZipValue, Ziplist};
