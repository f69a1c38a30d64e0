//! `btrfs_kit`: parses and reassembles btrfs metadata from raw device
//! images, including images too damaged for the kernel's own mount path —
//! grounded in `pegasusheavy-btrf-mount-windows`'s `core`/`blockdev` module
//! split, regrouped around the schema kernel / structure definitions / chunk
//! translation / scanning / record-mapping seams this crate adds on top.

pub mod chunk_cache;
pub mod device;
pub mod error;
pub mod record;
pub mod scanner;
pub mod schema;
pub mod structure;
pub mod walker;

pub use error::{ReconError, Result};
