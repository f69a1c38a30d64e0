//! Declarative-style binary schema kernel.
//!
//! Rather than an interpreted field-list DSL, each on-disk structure
//! implements [`FromCursor`]/[`ToBytes`] directly, calling the small set of
//! composable primitives in this module in the same order the bytes appear
//! on disk. This keeps the round-trip contract (`build(parse(bytes)) ==
//! bytes`, up to recomputed checksums) checkable field-by-field while
//! staying in ordinary Rust control flow instead of a separate interpreter.

pub mod bitflags_field;
pub mod combinators;
pub mod cursor;
pub mod enums;
pub mod primitive;
pub mod uuid_field;

pub use combinators::{checksum_crc32c, pointer_at, tell};
pub use cursor::{BuildCtx, Cursor, ParseCtx};
pub use enums::EnumByValue;
pub use primitive::*;
pub use uuid_field::{read_fsid_legacy, read_uuid_legacy, read_uuid_rfc, write_uuid_legacy, write_uuid_rfc};

use crate::error::{ReconError, Result};

/// Anything that can be decoded from a byte cursor.
///
/// Implementations should call [`Cursor::tell`] before and after their body
/// and store the results as `phys_start`/`phys_end` (see [`Addressable`]),
/// mirroring a `Tell`/`Computed` field pair.
pub trait FromCursor: Sized {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self>;
}

/// Anything that can be re-encoded to bytes.
///
/// `build(parse(bytes)) == bytes` must hold for any structurally valid
/// input, except for checksum fields which are always recomputed.
pub trait ToBytes {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()>;
}

/// Every parsed structure owns exactly the byte extent it was parsed from.
pub trait Addressable {
    fn phys_start(&self) -> u64;
    fn phys_end(&self) -> u64;
    fn phys_size(&self) -> u64 {
        self.phys_end() - self.phys_start()
    }
}

/// Parse `T` out of `cur` at the current position, failing if fewer than
/// `T`'s on-disk size bytes remain.
pub fn parse_at_current<T: FromCursor>(cur: &mut Cursor, ctx: &ParseCtx) -> Result<T> {
    T::parse(cur, ctx)
}

/// `Pointer(offset, subspec)`: parse a nested structure at an absolute
/// stream offset without disturbing the caller's cursor position.
pub fn parse_pointer<T: FromCursor>(cur: &Cursor, ctx: &ParseCtx, offset: u64) -> Result<T> {
    let mut sub = cur.fork_at(offset)?;
    T::parse(&mut sub, ctx)
}

/// `If(cond)`: parse `T` only when `cond` holds, else `None`.
pub fn parse_if<T: FromCursor>(cond: bool, cur: &mut Cursor, ctx: &ParseCtx) -> Result<Option<T>> {
    if cond {
        Ok(Some(T::parse(cur, ctx)?))
    } else {
        Ok(None)
    }
}

/// Fixed-count array: parse `n` consecutive `T`s.
pub fn parse_array<T: FromCursor>(cur: &mut Cursor, ctx: &ParseCtx, n: usize) -> Result<Vec<T>> {
    (0..n).map(|_| T::parse(cur, ctx)).collect()
}

/// Require that `n` more bytes are available in `cur`, returning the
/// caller's path/offset for a consistent [`ReconError::Parse`].
pub fn require(cur: &Cursor, path: &str, n: usize) -> Result<()> {
    if cur.remaining() < n {
        return Err(ReconError::parse(
            path,
            cur.tell(),
            format!("short read: need {n} bytes, have {}", cur.remaining()),
        ));
    }
    Ok(())
}
