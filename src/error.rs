//! Crate-wide error taxonomy.
//!
//! Library code returns [`ReconError`]; the CLI boundary wraps these in
//! `anyhow::Error`, and the library-internal variants follow the
//! `thiserror`-derived shape of `pegasusheavy-btrf-mount-windows`'s own
//! `BlockDeviceError` (`src/blockdev/mod.rs`).

use std::path::PathBuf;
use thiserror::Error;

/// A single step in a parse path, e.g. `superblock.dev_item.uuid`.
pub type ParsePath = String;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Structural decode failure: short read, bad magic, enum/range violation.
    #[error("parse error at {path} (offset {offset}): {reason}")]
    Parse {
        path: ParsePath,
        offset: u64,
        reason: String,
    },

    /// A checksum did not match its recomputed value, under strict validation.
    #[error("checksum mismatch at offset {offset}")]
    ChecksumMismatch { offset: u64 },

    /// The chunk cache has no interval covering a logical address.
    #[error("no chunk mapping covers logical address {logical:#x}")]
    Unmapped { logical: u64 },

    /// Translation of the chunk-root logical address failed during bootstrap.
    #[error("failed to bootstrap chunk tree: {reason}")]
    BootstrapFailure { reason: String },

    /// No mapper registered for a parsed struct type or leaf key type.
    #[error("no registry entry for {0}")]
    RegistryMiss(String),

    /// Two candidate structures in one transaction target the same Address
    /// with incompatible type tags.
    #[error("dedup conflict: address already owned by a different type tag ({existing} vs {incoming})")]
    DedupConflict { existing: String, incoming: String },

    /// Device I/O failure.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

impl ReconError {
    pub fn parse(path: impl Into<String>, offset: u64, reason: impl Into<String>) -> Self {
        ReconError::Parse {
            path: path.into(),
            offset,
            reason: reason.into(),
        }
    }

    pub fn io(path: Option<PathBuf>, source: std::io::Error) -> Self {
        ReconError::Io { path, source }
    }
}

impl From<std::io::Error> for ReconError {
    fn from(source: std::io::Error) -> Self {
        ReconError::Io { path: None, source }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
