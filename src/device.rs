//! Device Reader: a borrow-only view over a raw device image, generalizing
//! `ImageFile`'s memory-mapped block device access from "hand back mutable
//! pages for in-place writes" to "hand back an immutable byte slice for the
//! schema kernel to parse" — this tool never writes to the image it's
//! reconstructing from.

use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{ReconError, Result};

/// Anything that can answer "give me `len` bytes starting at `offset`" for a
/// raw device or image. Implemented by [`MmapDevice`] for real block devices
/// and regular files, and by a plain in-memory slice for tests and fixtures.
pub trait DeviceReader: Send + Sync {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a slice of exactly `len` bytes starting at `offset`, or a
    /// [`ReconError::Parse`] if that range runs past the end of the device.
    fn read_at(&self, offset: u64, len: usize) -> Result<&[u8]>;

    fn path(&self) -> Option<&Path> {
        None
    }
}

fn check_range(total_len: u64, offset: u64, len: usize, path: Option<&Path>) -> Result<()> {
    let end = offset
        .checked_add(len as u64)
        .ok_or_else(|| ReconError::parse("<device>", offset, "offset+len overflow"))?;
    if end > total_len {
        return Err(ReconError::parse(
            path.map(|p| p.display().to_string()).unwrap_or_else(|| "<device>".to_string()),
            offset,
            format!("read of {len} bytes at {offset:#x} runs past device length {total_len:#x}"),
        ));
    }
    Ok(())
}

/// A memory-mapped read-only view of a regular file or block device image.
pub struct MmapDevice {
    path: PathBuf,
    mmap: Mmap,
}

impl MmapDevice {
    pub fn open(path: &Path) -> Result<MmapDevice> {
        let file = File::open(path).map_err(|e| ReconError::io(Some(path.to_path_buf()), e))?;

        // SAFETY: the mapping is read-only for the lifetime of `MmapDevice`;
        // external mutation of the backing file while mapped is the one
        // hazard `memmap2` can't rule out for us.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ReconError::io(Some(path.to_path_buf()), e))?;

        Ok(MmapDevice { path: path.to_path_buf(), mmap })
    }
}

impl DeviceReader for MmapDevice {
    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<&[u8]> {
        check_range(self.mmap.len() as u64, offset, len, Some(&self.path))?;
        let start = offset as usize;
        Ok(&self.mmap[start..start + len])
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// An in-memory stand-in for a device, used by tests and by the record-store
/// test double to avoid touching real block devices.
pub struct MemoryDevice {
    data: Vec<u8>,
}

impl MemoryDevice {
    pub fn new(data: Vec<u8>) -> Self {
        MemoryDevice { data }
    }
}

impl DeviceReader for MemoryDevice {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<&[u8]> {
        check_range(self.data.len() as u64, offset, len, None)?;
        let start = offset as usize;
        Ok(&self.data[start..start + len])
    }
}

/// Convenience for callers that already have a `Range<u64>` (e.g. the
/// scanner's aligned sector sweep) rather than an `(offset, len)` pair.
pub fn read_range<'a>(dev: &'a dyn DeviceReader, range: Range<u64>) -> Result<&'a [u8]> {
    let len = (range.end - range.start) as usize;
    dev.read_at(range.start, len)
}
