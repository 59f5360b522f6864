//! Little-endian read/write helpers for the on-disk integer layouts used by
//! `sds`, `intset` and `ziplist`.
//!
//! Built on `byteorder`, the same crate an LZ4 frame codec reaches for to
//! read and write its frame headers through
//! `byteorder::{LittleEndian, ByteOrder}`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[inline]
pub(crate) fn read_u16(buf: &[u8]) -> u16 {
    LittleEndian::read_u16(buf)
}

#[inline]
pub(crate) fn write_u16(buf: &mut [u8], v: u16) {
    LittleEndian::write_u16(buf, v)
}

#[inline]
pub(crate) fn read_u32(buf: &[u8]) -> u32 {
    LittleEndian::read_u32(buf)
}

#[inline]
pub(crate) fn write_u32(buf: &mut [u8], v: u32) {
    LittleEndian::write_u32(buf, v)
}

#[inline]
pub(crate) fn read_i16(buf: &[u8]) -> i16 {
    LittleEndian::read_i16(buf)
}

#[inline]
pub(crate) fn write_i16(buf: &mut [u8], v: i16) {
    LittleEndian::write_i16(buf, v)
}

#[inline]
pub(crate) fn read_i32(buf: &[u8]) -> i32 {
    LittleEndian::read_i32(buf)
}

#[inline]
pub(crate) fn write_i32(buf: &mut [u8], v: i32) {
    LittleEndian::write_i32(buf, v)
}

#[inline]
pub(crate) fn read_i64(buf: &[u8]) -> i64 {
    LittleEndian::read_i64(buf)
}

#[inline]
pub(crate) fn write_i64(buf: &mut [u8], v: i64) {
    LittleEndian::write_i64(buf, v)
}

/// The ziplist string-length headers (14-bit and 32-bit forms) are the one
/// big-endian exception in an otherwise little-endian wire format.
#[inline]
pub(crate) fn read_u32_be(buf: &[u8]) -> u32 {
    BigEndian::read_u32(buf)
}

#[inline]
pub(crate) fn write_u32_be(buf: &mut [u8], v: u32) {
    BigEndian::write_u32(buf, v)
}
