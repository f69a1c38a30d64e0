//! `ObjectId`, `KeyType`, `Key`, `KeyPtr` — grounded in
//! `original_source/btrfs_recon/structure/key.py`, which carries the full
//! enumeration (including the negative/high sentinel object ids) that
//! `pegasusheavy-btrf-mount-windows`'s `item_type` constant group only
//! partially covers. `Key`'s field order (`objectid`, `item_type`, `offset`)
//! and derived total ordering follow that repo's `BtrfsKey` exactly.

use crate::schema::enums::{enum_by_value, EnumByValue};
use crate::schema::{read_i64_le, read_u64_le, read_u8, write_i64_le, write_u64_le, write_u8};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};
use crate::error::Result;

enum_by_value! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ObjectId: i64 {
        DevStats = 0,
        RootTree = 1,
        ExtentTree = 2,
        ChunkTree = 3,
        DevTree = 4,
        FsTree = 5,
        RootTreeDir = 6,
        CsumTree = 7,
        QuotaTree = 8,
        UuidTree = 9,
        FreeSpaceTree = 10,
        BlockGroupTree = 11,
        Balance = -4,
        Orphan = -5,
        TreeLog = -6,
        TreeLogFixup = -7,
        TreeReloc = -8,
        DataRelocTree = -9,
        ExtentCsum = -10,
        FreeSpace = -11,
        FreeIno = -12,
        Multiple = -255,
        FirstChunkTree = 256,
    }
}

enum_by_value! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum KeyType: u8 {
        InodeItem = 0x01,
        InodeRef = 0x0c,
        InodeExtref = 0x0d,
        XattrItem = 0x18,
        VerityDescItem = 0x24,
        VerityMerkleItem = 0x25,
        OrphanItem = 0x30,
        DirLogItem = 0x3c,
        DirLogIndex = 0x48,
        DirItem = 0x54,
        DirIndex = 0x60,
        ExtentData = 0x6c,
        CsumItem = 0x78,
        ExtentCsum = 0x80,
        RootItem = 0x84,
        RootBackref = 0x90,
        RootRef = 0x9c,
        ExtentItem = 0xa8,
        MetadataItem = 0xa9,
        TreeBlockRef = 0xb0,
        ExtentDataRef = 0xb2,
        ExtentRefV0 = 0xb4,
        SharedBlockRef = 0xb6,
        SharedDataRef = 0xb8,
        BlockGroupItem = 0xc0,
        FreeSpaceInfo = 0xc6,
        FreeSpaceExtent = 0xc7,
        FreeSpaceBitmap = 0xc8,
        DevExtent = 0xcc,
        DevItem = 0xd8,
        ChunkItem = 0xe4,
        QgroupStatus = 0xf0,
        QgroupInfo = 0xf2,
        QgroupLimit = 0xf4,
        QgroupRelation = 0xf6,
        TemporaryItem = 0xf8,
        PersistentItem = 0xf9,
        DevReplace = 0xfa,
        UuidKeySubvol = 0xfb,
        UuidKeyReceivedSubvol = 0xfc,
        StringItem = 0xfd,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub objectid: u64,
    pub ty: KeyType,
    pub offset: u64,
}

impl FromCursor for Key {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let objectid = read_u64_le(cur, &ctx.child("objectid").path)?;
        let ty = KeyType::from_value(read_u8(cur, &ctx.child("ty").path)?);
        let offset = read_u64_le(cur, &ctx.child("offset").path)?;
        Ok(Key { objectid, ty, offset })
    }
}

impl ToBytes for Key {
    fn build(&self, out: &mut Vec<u8>, _ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.objectid);
        write_u8(out, self.ty.to_value());
        write_u64_le(out, self.offset);
        Ok(())
    }
}

impl Key {
    /// Total ordering used by tree search (internal node walk):
    /// objectid, then type, then offset, all ascending.
    pub fn cmp_order(&self, other: &Key) -> std::cmp::Ordering {
        (self.objectid, self.ty.to_value(), self.offset)
            .cmp(&(other.objectid, other.ty.to_value(), other.offset))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyPtr {
    pub key: Key,
    pub blockptr: u64,
    pub generation: u64,
}

impl FromCursor for KeyPtr {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let key = Key::parse(cur, &ctx.child("key"))?;
        let blockptr = read_u64_le(cur, &ctx.child("blockptr").path)?;
        let generation = read_u64_le(cur, &ctx.child("generation").path)?;
        Ok(KeyPtr { key, blockptr, generation })
    }
}

impl ToBytes for KeyPtr {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        self.key.build(out, ctx)?;
        write_u64_le(out, self.blockptr);
        write_u64_le(out, self.generation);
        Ok(())
    }
}

// i64 read/write helper re-exported here for ObjectId users that need the
// signed form (negative sentinel object ids).
pub fn read_objectid_i64(cur: &mut Cursor, path: &str) -> Result<i64> {
    read_i64_le(cur, path)
}

pub fn write_objectid_i64(out: &mut Vec<u8>, v: i64) {
    write_i64_le(out, v)
}
