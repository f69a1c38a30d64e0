//! Registry: dispatches a leaf item's key type to the mapper that
//! turns its already-decoded [`LeafPayload`] into one or more [`Record`]s.
//!
//! Conceptually a "triple-indexed table" keyed by
//! `{parsed-struct-type, record-type, leaf-key-type}`; in this crate the
//! struct type and record type are already fused statically by
//! [`RecordPayload`]'s variants, so a single `KeyType → MapperFn` index
//! carries the same information without a runtime struct/record axis — see
//! DESIGN.md. Populated lazily behind a `OnceLock`, mirroring
//! `std::sync::OnceLock`-based registries elsewhere in the corpus rather than a
//! `lazy_static`/`inventory`-style plugin mechanism, since the mapper set is
//! fixed at compile time.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{ReconError, Result};
use crate::structure::{KeyType, LeafPayload};

use super::{mapper, Record};

/// Maps an already-typed leaf payload plus its physical location to the
/// records it produces. Returns `Ok(vec![])` for payloads this crate
/// doesn't persist (e.g. unresolved `Raw` blobs).
pub type MapperFn = fn(LeafPayload, u64, u64, Option<u64>) -> Result<Vec<Record>>;

fn dispatch_inode_item(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::InodeItem(v) => Ok(vec![mapper::map_inode_item(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_inode_ref(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::InodeRef(v) => Ok(vec![mapper::map_inode_ref(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_dir_item(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::DirItem(v) => Ok(vec![mapper::map_dir_item(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_file_extent(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::FileExtentItem(v) => Ok(vec![mapper::map_file_extent_item(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_root_item(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::RootItem(v) => Ok(vec![mapper::map_root_item(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_root_ref(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::RootRef(v) => Ok(vec![mapper::map_root_ref(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_extent_item(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::ExtentItem(v) => Ok(vec![mapper::map_extent_item(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_dev_item(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::DevItem(v) => Ok(vec![mapper::map_dev_item(v, device_id, phys, parent)?]),
        _ => Ok(vec![]),
    }
}

fn dispatch_chunk_item(p: LeafPayload, device_id: u64, phys: u64, parent: Option<u64>) -> Result<Vec<Record>> {
    match p {
        LeafPayload::ChunkItem(v) => mapper::map_chunk_item(v, device_id, phys, parent),
        _ => Ok(vec![]),
    }
}

fn build_registry() -> HashMap<KeyType, MapperFn> {
    let mut m: HashMap<KeyType, MapperFn> = HashMap::new();
    let mut register = |key: KeyType, f: MapperFn| {
        if m.insert(key, f).is_some() {
            panic!("duplicate mapper registration for key type {key:?}");
        }
    };
    register(KeyType::InodeItem, dispatch_inode_item);
    register(KeyType::InodeRef, dispatch_inode_ref);
    register(KeyType::InodeExtref, dispatch_inode_ref);
    register(KeyType::DirItem, dispatch_dir_item);
    register(KeyType::DirIndex, dispatch_dir_item);
    register(KeyType::XattrItem, dispatch_dir_item);
    register(KeyType::ExtentData, dispatch_file_extent);
    register(KeyType::RootItem, dispatch_root_item);
    register(KeyType::RootRef, dispatch_root_ref);
    register(KeyType::RootBackref, dispatch_root_ref);
    register(KeyType::ExtentItem, dispatch_extent_item);
    register(KeyType::MetadataItem, dispatch_extent_item);
    register(KeyType::DevItem, dispatch_dev_item);
    register(KeyType::ChunkItem, dispatch_chunk_item);
    m
}

static REGISTRY: OnceLock<HashMap<KeyType, MapperFn>> = OnceLock::new();

/// Looks up the mapper for `key_type`. Unknown key types (including the
/// `Unknown(_)` fallback variant) have no mapper: unknown key types produce
/// a leaf item with no payload, not an error.
pub fn lookup(key_type: KeyType) -> Option<MapperFn> {
    REGISTRY.get_or_init(build_registry).get(&key_type).copied()
}

/// Maps a leaf item's payload via its key type, or returns an empty record
/// list for key types with no registered mapper.
pub fn map_leaf_payload(
    key_type: KeyType,
    payload: LeafPayload,
    device_id: u64,
    phys: u64,
    parent: Option<u64>,
) -> Result<Vec<Record>> {
    match lookup(key_type) {
        Some(f) => f(payload, device_id, phys, parent),
        None => Ok(vec![]),
    }
}

/// Used by callers that require a mapper to exist (e.g. re-parsing a known
/// structure outside the leaf-item dispatch path).
pub fn require(key_type: KeyType) -> Result<MapperFn> {
    lookup(key_type).ok_or_else(|| ReconError::RegistryMiss(format!("{key_type:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_type_has_no_mapper() {
        assert!(lookup(KeyType::Unknown(0xfe)).is_none());
    }

    #[test]
    fn known_key_types_are_registered() {
        assert!(lookup(KeyType::InodeItem).is_some());
        assert!(lookup(KeyType::ChunkItem).is_some());
    }
}
