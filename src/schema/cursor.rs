//! [`Cursor`] walks a byte slice recording position, the way a
//! `MappedFile` walked a memory-mapped image — except here the cursor
//! borrows a plain slice, so the same type works for both mmap-backed reads
//! and in-memory test fixtures.

use crate::error::{ReconError, Result};

/// A read-only cursor over a borrowed byte buffer.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    /// `Tell`: the current stream position.
    pub fn tell(&self) -> u64 {
        self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All bytes backing this cursor, irrespective of current position —
    /// used by `Pointer` to seek to absolute offsets.
    pub fn whole(&self) -> &'a [u8] {
        self.data
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        let pos = pos as usize;
        if pos > self.data.len() {
            return Err(ReconError::parse(
                "<seek>",
                pos as u64,
                format!("seek past end of buffer (len={})", self.data.len()),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    /// Consume and return exactly `n` bytes, advancing the cursor.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ReconError::parse(
                "<take>",
                self.tell(),
                format!("short read: need {n} bytes, have {}", self.remaining()),
            ));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// A new cursor over the same buffer, repositioned at `offset`, leaving
    /// `self` untouched — the mechanism behind `Pointer`.
    pub fn fork_at(&self, offset: u64) -> Result<Cursor<'a>> {
        let mut c = Cursor::new(self.data);
        c.seek(offset)?;
        Ok(c)
    }
}

/// Read-only context threaded explicitly through parsing, per the
/// "no global mutable state" redesign flag: every `Pointer`/`Switch` gets an
/// explicit handle to whatever ambient data it needs (currently just a path
/// prefix used for error messages; structures needing sibling fields pass
/// them as plain function arguments instead of reaching into a shared
/// context, since Rust's ownership model makes that the more idiomatic
/// choice over a dynamically-typed context object).
#[derive(Clone, Debug, Default)]
pub struct ParseCtx {
    pub path: String,
    /// When true, checksum fields are validated against recomputed values
    /// instead of being tolerated unconditionally.
    pub strict_checksums: bool,
}

impl ParseCtx {
    pub fn root() -> Self {
        ParseCtx {
            path: String::new(),
            strict_checksums: false,
        }
    }

    pub fn strict() -> Self {
        ParseCtx {
            path: String::new(),
            strict_checksums: true,
        }
    }

    pub fn child(&self, field: &str) -> Self {
        let path = if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.path, field)
        };
        ParseCtx {
            path,
            strict_checksums: self.strict_checksums,
        }
    }
}

/// Context for the build (re-encode) direction. Currently only carries
/// whether legacy (byte-swapped) UUID encoding should be used, since that
/// selector is context-driven rather than a fixed per-field choice.
#[derive(Clone, Debug, Default)]
pub struct BuildCtx {
    pub swapped_uuids: bool,
}
