//! Record Mapper / Address Dedup Hook / Registry.
//!
//! Persistence itself is treated as an external collaborator — no
//! example repo in the pack depends on a database crate for this class of
//! tool, so this module ships only the seam (`RecordStore`) and an
//! in-memory test double, grounded in
//! `original_source/btrfs_recon/persistence/models/{base,address}.py`'s
//! shape (an `Address` row plus a generically-tagged owner) translated into
//! a Rust tagged sum instead of a SQLAlchemy generic relationship.

pub mod dedup;
pub mod mapper;
pub mod registry;

use crate::error::Result;
use crate::structure::{ChunkItem, DevItem, DirItem, FileExtentItem, Header, InodeItem, InodeRef, RootItem, RootRef, Stripe, Superblock};

/// `(device_id, phys, phys_size)` — the natural key of an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressKey {
    pub device_id: u64,
    pub phys: u64,
    pub phys_size: u64,
}

/// A persisted physical location, owned by exactly one [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub id: u64,
    pub key: AddressKey,
}

impl Address {
    pub fn key(device_id: u64, phys: u64, phys_size: u64) -> AddressKey {
        AddressKey { device_id, phys, phys_size }
    }
}

/// Identifies which parsed structure type a [`Record`] carries — the
/// "type-tag" the Address Dedup Hook compares across candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Superblock,
    Header,
    InodeItem,
    InodeRef,
    DirItem,
    FileExtentItem,
    RootItem,
    RootRef,
    ExtentItem,
    DevItem,
    ChunkItem,
    Stripe,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The normalized payload a mapper produces from a parsed structure. Holds
/// the structure by value rather than a serialized blob, since this crate
/// has no record-store backend that would need a wire format.
#[derive(Debug, Clone)]
pub enum RecordPayload {
    Superblock(Box<Superblock>),
    Header(Box<Header>),
    InodeItem(Box<InodeItem>),
    InodeRef(Box<InodeRef>),
    DirItem(Box<DirItem>),
    FileExtentItem(Box<FileExtentItem>),
    RootItem(Box<RootItem>),
    RootRef(Box<RootRef>),
    ExtentItem(Box<crate::structure::ExtentItem>),
    DevItem(Box<DevItem>),
    ChunkItem(Box<ChunkItem>),
    Stripe(Box<Stripe>),
}

impl RecordPayload {
    pub fn tag(&self) -> TypeTag {
        match self {
            RecordPayload::Superblock(_) => TypeTag::Superblock,
            RecordPayload::Header(_) => TypeTag::Header,
            RecordPayload::InodeItem(_) => TypeTag::InodeItem,
            RecordPayload::InodeRef(_) => TypeTag::InodeRef,
            RecordPayload::DirItem(_) => TypeTag::DirItem,
            RecordPayload::FileExtentItem(_) => TypeTag::FileExtentItem,
            RecordPayload::RootItem(_) => TypeTag::RootItem,
            RecordPayload::RootRef(_) => TypeTag::RootRef,
            RecordPayload::ExtentItem(_) => TypeTag::ExtentItem,
            RecordPayload::DevItem(_) => TypeTag::DevItem,
            RecordPayload::ChunkItem(_) => TypeTag::ChunkItem,
            RecordPayload::Stripe(_) => TypeTag::Stripe,
        }
    }
}

/// One mapped structure, ready to persist. `id` is `None` for a fresh
/// insert and `Some(existing_id)` once the Address Dedup Hook has matched it
/// to a prior row.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: Option<u64>,
    pub parent_id: Option<u64>,
    pub address: Option<AddressKey>,
    pub schema_version: u32,
    pub payload: RecordPayload,
}

pub const SCHEMA_VERSION: u32 = 1;

/// The persistence seam. Nothing in this crate ships a real implementation
/// beyond [`dedup::InMemoryStore`]; a production backend is an external
/// collaborator.
pub trait RecordStore {
    /// Returns existing addresses whose key is in `keys`, for the dedup hook.
    fn find_addresses(&self, keys: &[AddressKey]) -> Result<Vec<Address>>;

    /// Commits `records` within a single transaction. Implementations are
    /// expected to run the Address Dedup Hook before applying inserts, so
    /// a record that matches an existing address updates it instead of
    /// creating a duplicate.
    fn commit(&mut self, records: Vec<Record>) -> Result<()>;
}
