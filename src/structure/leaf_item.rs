//! Leaf item: `(key, offset, size)` header plus a payload dispatched on the
//! key's type — grounded in `original_source/btrfs_recon/structure/leaf_item.py`'s
//! `_get_data_field()` switch.

use crate::error::Result;
use crate::schema::{read_u32_le, write_u32_le};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};

use super::chunk::ChunkItem;
use super::dev_item::DevItem;
use super::dir_item::DirItem;
use super::extent_item::ExtentItem;
use super::file_extent::FileExtentItem;
use super::inode::{InodeItem, InodeRef};
use super::key::{Key, KeyType};
use super::root_item::RootItem;
use super::root_ref::RootRef;

/// The typed view of a leaf item's data blob, dispatched on `key.ty`.
/// Key types with no modeled payload (or payloads this crate doesn't parse
/// structurally, e.g. `CsumItem`'s raw checksum array) fall back to `Raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafPayload {
    InodeItem(InodeItem),
    InodeRef(InodeRef),
    DirItem(DirItem),
    FileExtentItem(FileExtentItem),
    RootItem(RootItem),
    RootRef(RootRef),
    ExtentItem(ExtentItem),
    DevItem(DevItem),
    ChunkItem(ChunkItem),
    Raw(Vec<u8>),
}

impl LeafPayload {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx, ty: KeyType) -> Result<Self> {
        Ok(match ty {
            KeyType::InodeItem => LeafPayload::InodeItem(InodeItem::parse(cur, ctx)?),
            KeyType::InodeRef | KeyType::InodeExtref => LeafPayload::InodeRef(InodeRef::parse(cur, ctx)?),
            KeyType::DirItem | KeyType::DirIndex | KeyType::XattrItem => {
                LeafPayload::DirItem(DirItem::parse(cur, ctx)?)
            }
            KeyType::ExtentData => LeafPayload::FileExtentItem(FileExtentItem::parse(cur, ctx)?),
            KeyType::RootItem => LeafPayload::RootItem(RootItem::parse(cur, ctx)?),
            KeyType::RootRef | KeyType::RootBackref => LeafPayload::RootRef(RootRef::parse(cur, ctx)?),
            KeyType::ExtentItem | KeyType::MetadataItem => LeafPayload::ExtentItem(ExtentItem::parse(cur, ctx)?),
            KeyType::DevItem => LeafPayload::DevItem(DevItem::parse(cur, ctx)?),
            KeyType::ChunkItem => LeafPayload::ChunkItem(ChunkItem::parse(cur, ctx)?),
            _ => LeafPayload::Raw(cur.take(cur.remaining())?.to_vec()),
        })
    }

    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        match self {
            LeafPayload::InodeItem(v) => v.build(out, ctx),
            LeafPayload::InodeRef(v) => v.build(out, ctx),
            LeafPayload::DirItem(v) => v.build(out, ctx),
            LeafPayload::FileExtentItem(v) => v.build(out, ctx),
            LeafPayload::RootItem(v) => v.build(out, ctx),
            LeafPayload::RootRef(v) => v.build(out, ctx),
            LeafPayload::ExtentItem(v) => v.build(out, ctx),
            LeafPayload::DevItem(v) => v.build(out, ctx),
            LeafPayload::ChunkItem(v) => v.build(out, ctx),
            LeafPayload::Raw(bytes) => {
                out.extend_from_slice(bytes);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafItem {
    pub key: Key,
    pub data_offset: u32,
    pub data_size: u32,
    pub payload: LeafPayload,
}

impl LeafItem {
    /// Parses the fixed-size `(key, offset, size)` header at the cursor's
    /// current position, then follows `Pointer(header_end + offset)` to
    /// decode the variable-length payload — mirroring the original's
    /// `Pointer(lambda ctx: ctx._.header.phys_end + ctx.offset, ...)`.
    pub fn parse_at(cur: &mut Cursor, ctx: &ParseCtx, header_end: u64) -> Result<Self> {
        let key = Key::parse(cur, &ctx.child("key"))?;
        let data_offset = read_u32_le(cur, &ctx.child("offset").path)?;
        let data_size = read_u32_le(cur, &ctx.child("size").path)?;
        let payload: LeafPayload = parse_pointer_payload(cur, ctx, header_end + data_offset as u64, data_size, key.ty)?;
        Ok(LeafItem { key, data_offset, data_size, payload })
    }

    pub fn build_header(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        self.key.build(out, ctx)?;
        write_u32_le(out, self.data_offset);
        write_u32_le(out, self.data_size);
        Ok(())
    }

    pub fn build_payload(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        self.payload.build(out, ctx)
    }
}

fn parse_pointer_payload(
    cur: &Cursor,
    ctx: &ParseCtx,
    offset: u64,
    size: u32,
    ty: KeyType,
) -> Result<LeafPayload> {
    let mut sub = cur.fork_at(offset)?;
    crate::schema::require(&sub, &ctx.child("data").path, size as usize)?;
    let limited = &sub.whole()[offset as usize..(offset as usize + size as usize)];
    let mut limited_cur = Cursor::new(limited);
    let payload = LeafPayload::parse(&mut limited_cur, &ctx.child("data"), ty)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::chunk::{BlockGroupFlags, Stripe};

    #[test]
    fn chunk_item_leaf_roundtrips_through_pointer() {
        let chunk = ChunkItem {
            length: 0x4000_0000,
            owner: 2,
            stripe_len: 0x10000,
            ty: BlockGroupFlags::METADATA,
            io_align: 4096,
            io_width: 4096,
            sector_size: 4096,
            num_stripes: 1,
            sub_stripes: 1,
            stripes: vec![Stripe { devid: 1, offset: 0, dev_uuid: uuid::Uuid::nil() }],
        };
        let mut payload_bytes = Vec::new();
        chunk.build(&mut payload_bytes, &BuildCtx::default()).unwrap();

        let key = Key { objectid: 256, ty: KeyType::ChunkItem, offset: 0 };
        let mut header = Vec::new();
        key.build(&mut header, &BuildCtx::default()).unwrap();
        write_u32_le(&mut header, 0);
        write_u32_le(&mut header, payload_bytes.len() as u32);

        let mut whole = header.clone();
        whole.extend_from_slice(&payload_bytes);

        let header_end = header.len() as u64;
        let mut cur = Cursor::new(&whole);
        let item = LeafItem::parse_at(&mut cur, &ParseCtx::root(), header_end).unwrap();
        assert_eq!(item.key, key);
        assert_eq!(item.payload, LeafPayload::ChunkItem(chunk));
    }
}
