//! Record Mapper: declarative per-structure mapping from a parsed
//! value to a [`Record`], grounded in
//! `original_source/btrfs_recon/persistence/serializers/base.py`'s
//! `BaseSchema`/`post_load` pattern — expressed here as one small function
//! per structure instead of a generic (de)serializer, since Rust's type
//! system already gives each structure a distinct static type.

use crate::error::Result;
use crate::schema::{BuildCtx, ToBytes};
use crate::structure::{
    ChunkItem, DevItem, DirItem, ExtentItem, FileExtentItem, Header, InodeItem, InodeRef, RootItem, RootRef, Stripe,
    Superblock,
};

use super::{Address, AddressKey, Record, RecordPayload, SCHEMA_VERSION};

/// The on-disk size of `value` as it would actually be re-encoded —
/// mirrors the original's `phys_size` field (`base.py`'s `Struct` dataclass
/// records it from the underlying `construct` stream; here it's recomputed
/// via [`ToBytes::build`] since this crate's parse path doesn't thread a
/// mutable "bytes consumed" accumulator through every call site).
fn encoded_size<T: ToBytes>(value: &T) -> Result<u64> {
    let mut buf = Vec::new();
    value.build(&mut buf, &BuildCtx::default())?;
    Ok(buf.len() as u64)
}

fn address_for<T: ToBytes>(value: &T, device_id: u64, phys: u64) -> Result<AddressKey> {
    let size = encoded_size(value)?;
    Ok(Address::key(device_id, phys, size))
}

fn record<T: ToBytes>(
    value: T,
    device_id: u64,
    phys: u64,
    parent_id: Option<u64>,
    to_payload: impl FnOnce(T) -> RecordPayload,
) -> Result<Record>
where
    T: Clone,
{
    let address = Some(address_for(&value, device_id, phys)?);
    Ok(Record {
        id: None,
        parent_id,
        address,
        schema_version: SCHEMA_VERSION,
        payload: to_payload(value),
    })
}

pub fn map_superblock(sb: Superblock, device_id: u64, phys: u64) -> Result<Record> {
    record(sb, device_id, phys, None, |v| RecordPayload::Superblock(Box::new(v)))
}

pub fn map_header(header: Header, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(header, device_id, phys, parent_id, |v| RecordPayload::Header(Box::new(v)))
}

pub fn map_inode_item(item: InodeItem, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::InodeItem(Box::new(v)))
}

pub fn map_inode_ref(item: InodeRef, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::InodeRef(Box::new(v)))
}

pub fn map_dir_item(item: DirItem, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::DirItem(Box::new(v)))
}

pub fn map_file_extent_item(
    item: FileExtentItem,
    device_id: u64,
    phys: u64,
    parent_id: Option<u64>,
) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::FileExtentItem(Box::new(v)))
}

pub fn map_root_item(item: RootItem, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::RootItem(Box::new(v)))
}

pub fn map_root_ref(item: RootRef, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::RootRef(Box::new(v)))
}

pub fn map_extent_item(item: ExtentItem, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::ExtentItem(Box::new(v)))
}

pub fn map_dev_item(item: DevItem, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Record> {
    record(item, device_id, phys, parent_id, |v| RecordPayload::DevItem(Box::new(v)))
}

/// Maps a chunk item *and* its stripes: for nested structures, recursively
/// produces child records. Stripe records carry
/// `parent_id: None`; [`crate::record::RecordStore`] implementations are
/// expected to backfill it with the chunk item's assigned id once the
/// parent record itself has been committed.
pub fn map_chunk_item(item: ChunkItem, device_id: u64, phys: u64, parent_id: Option<u64>) -> Result<Vec<Record>> {
    let stripes = item.stripes.clone();
    let chunk_record = record(item, device_id, phys, parent_id, |v| RecordPayload::ChunkItem(Box::new(v)))?;
    let mut out = vec![chunk_record];
    let mut stripe_phys = phys;
    for stripe in stripes {
        out.push(record(stripe, device_id, stripe_phys, None, |v| RecordPayload::Stripe(Box::new(v)))?);
        stripe_phys += Stripe::SIZE as u64;
    }
    Ok(out)
}
