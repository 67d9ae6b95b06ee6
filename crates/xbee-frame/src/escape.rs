//! Byte-stuffing and checksum helpers.
//!
//! Every byte after the start delimiter, from the length field through the
//! checksum, is escaped if it is one of [`RESERVED_BYTES`]. An escaped byte is
//! sent as [`ESCAPE_BYTE`] followed by the byte XORed with [`ESCAPE_MASK`].
//! Length and checksum are always computed on the unescaped bytes.

use bytes::BufMut;

use crate::constants::*;

/// Returns true if `byte` must be escaped on the wire.
#[inline]
pub fn needs_escape(byte: u8) -> bool {
    RESERVED_BYTES.contains(&byte)
}

/// Escape a single byte.
///
/// Returns the byte to send after [`ESCAPE_BYTE`], or `None` if the byte goes
/// out unchanged.
#[inline]
pub fn escape_byte(byte: u8) -> Option<u8> {
    needs_escape(byte).then_some(byte ^ ESCAPE_MASK)
}

/// Recover the logical byte that followed an [`ESCAPE_BYTE`].
#[inline]
pub fn unescape_byte(raw: u8) -> u8 {
    raw ^ ESCAPE_MASK
}

/// Write `data` escaped into `out`. Returns the number of escapes added.
pub fn escape_into<B: BufMut>(data: &[u8], out: &mut B) -> usize {
    let mut escapes = 0;
    for &byte in data {
        match escape_byte(byte) {
            Some(escaped) => {
                out.put_u8(ESCAPE_BYTE);
                out.put_u8(escaped);
                escapes += 1;
            }
            None => out.put_u8(byte),
        }
    }
    escapes
}

/// Number of bytes in `data` that need escaping.
pub fn escape_count(data: &[u8]) -> usize {
    data.iter().filter(|&&b| needs_escape(b)).count()
}

/// Checksum over unescaped content (frame type through last payload byte).
pub fn checksum(content: &[u8]) -> u8 {
    let sum = content.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    CHECKSUM_BASE.wrapping_sub(sum)
}

/// Returns true if `checksum` is valid for `content`.
pub fn verify_checksum(content: &[u8], checksum_byte: u8) -> bool {
    checksum(content) == checksum_byte
}
