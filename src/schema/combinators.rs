//! `Pointer`, `Tell`, `Computed`, `RawCopy`, and `Checksum` — the
//! structural combinators that don't reduce to a single
//! primitive read. `If`/`Switch`/fixed and count-prefixed arrays live as
//! free functions in `schema/mod.rs` (`parse_if`, `parse_array`) since they
//! are generic over any [`super::FromCursor`] type; `Switch` dispatch for
//! leaf item payloads is realized through the Registry (`record::registry`)
//! rather than here, since its arms are keyed by a runtime-extensible
//! key-type rather than a fixed compile-time list.

use super::cursor::{Cursor, ParseCtx};
use crate::error::Result;

/// `Tell`: current stream position.
pub fn tell(cur: &Cursor) -> u64 {
    cur.tell()
}

/// `Pointer(offset, subspec)`: parse `T` at an absolute offset without
/// advancing `cur`.
pub fn pointer_at<T: super::FromCursor>(cur: &Cursor, ctx: &ParseCtx, offset: u64) -> Result<T> {
    super::parse_pointer(cur, ctx, offset)
}

/// `RawCopy`: parse `T` via `parse_fn` while also capturing the exact bytes
/// it consumed, for checksum/round-trip verification.
pub fn raw_copy<'a, T>(
    cur: &mut Cursor<'a>,
    parse_fn: impl FnOnce(&mut Cursor<'a>) -> Result<T>,
) -> Result<(T, &'a [u8])> {
    let start = cur.tell() as usize;
    let whole = cur.whole();
    let value = parse_fn(cur)?;
    let end = cur.tell() as usize;
    Ok((value, &whole[start..end]))
}

/// CRC32C (Castagnoli) checksum over `data`, as used for the superblock and
/// tree-node header checksums. Always returns a full 32-byte
/// slot with the 4-byte CRC in the first bytes and the rest zeroed, matching
/// the on-disk convention `csum_data_crc32` already followed.
pub fn checksum_crc32c(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let crc = crc32c::crc32c(data).to_le_bytes();
    out[..4].copy_from_slice(&crc);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let a = checksum_crc32c(b"hello world");
        let b = checksum_crc32c(b"hello world");
        assert_eq!(a, b);
        assert_ne!(checksum_crc32c(b"hello world"), checksum_crc32c(b"goodbye"));
    }

    #[test]
    fn raw_copy_captures_consumed_bytes() {
        let buf = [1u8, 2, 3, 4, 5, 6];
        let mut cur = Cursor::new(&buf);
        let (v, bytes) = raw_copy(&mut cur, |c| super::primitive::read_u32_le(c, "x")).unwrap();
        assert_eq!(v, u32::from_le_bytes([1, 2, 3, 4]));
        assert_eq!(bytes, &[1, 2, 3, 4]);
    }
}
