//! Device item, grounded in `original_source/btrfs_recon/structure/dev_item.py`
//! and `pegasusheavy-btrf-mount-windows`'s on-disk `btrfs_dev_item` fields.

use crate::error::Result;
use crate::schema::{read_u32_le, read_u64_le, read_u8, write_u32_le, write_u64_le, write_u8};
use crate::schema::{read_fsid_legacy, read_uuid_legacy, write_uuid_legacy};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevItem {
    pub devid: u64,
    pub total_bytes: u64,
    pub bytes_used: u64,
    pub io_align: u32,
    pub io_width: u32,
    pub sector_size: u32,
    pub ty: u64,
    pub generation: u64,
    pub start_offset: u64,
    pub dev_group: u32,
    pub seek_speed: u8,
    pub bandwidth: u8,
    pub uuid: Uuid,
    pub fsid: Uuid,
}

impl FromCursor for DevItem {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let devid = read_u64_le(cur, &ctx.child("devid").path)?;
        let total_bytes = read_u64_le(cur, &ctx.child("total_bytes").path)?;
        let bytes_used = read_u64_le(cur, &ctx.child("bytes_used").path)?;
        let io_align = read_u32_le(cur, &ctx.child("io_align").path)?;
        let io_width = read_u32_le(cur, &ctx.child("io_width").path)?;
        let sector_size = read_u32_le(cur, &ctx.child("sector_size").path)?;
        let ty = read_u64_le(cur, &ctx.child("type").path)?;
        let generation = read_u64_le(cur, &ctx.child("generation").path)?;
        let start_offset = read_u64_le(cur, &ctx.child("start_offset").path)?;
        let dev_group = read_u32_le(cur, &ctx.child("dev_group").path)?;
        let seek_speed = read_u8(cur, &ctx.child("seek_speed").path)?;
        let bandwidth = read_u8(cur, &ctx.child("bandwidth").path)?;
        let uuid = read_uuid_legacy(cur, &ctx.child("uuid").path)?;
        let fsid = read_fsid_legacy(cur, &ctx.child("fsid").path)?;
        Ok(DevItem {
            devid,
            total_bytes,
            bytes_used,
            io_align,
            io_width,
            sector_size,
            ty,
            generation,
            start_offset,
            dev_group,
            seek_speed,
            bandwidth,
            uuid,
            fsid,
        })
    }
}

impl ToBytes for DevItem {
    fn build(&self, out: &mut Vec<u8>, _ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.devid);
        write_u64_le(out, self.total_bytes);
        write_u64_le(out, self.bytes_used);
        write_u32_le(out, self.io_align);
        write_u32_le(out, self.io_width);
        write_u32_le(out, self.sector_size);
        write_u64_le(out, self.ty);
        write_u64_le(out, self.generation);
        write_u64_le(out, self.start_offset);
        write_u32_le(out, self.dev_group);
        write_u8(out, self.seek_speed);
        write_u8(out, self.bandwidth);
        write_uuid_legacy(out, &self.uuid);
        write_uuid_legacy(out, &self.fsid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_item_roundtrip() {
        let d = DevItem {
            devid: 1,
            total_bytes: 0x1_0000_0000,
            bytes_used: 0x8000_0000,
            io_align: 4096,
            io_width: 4096,
            sector_size: 4096,
            ty: 0,
            generation: 0,
            start_offset: 0,
            dev_group: 0,
            seek_speed: 0,
            bandwidth: 0,
            uuid: Uuid::nil(),
            fsid: Uuid::parse_str("bba692f7-5be7-4173-bc27-bb3e21644739").unwrap(),
        };
        let mut buf = Vec::new();
        d.build(&mut buf, &BuildCtx::default()).unwrap();
        let mut cur = Cursor::new(&buf);
        let parsed = DevItem::parse(&mut cur, &ParseCtx::root()).unwrap();
        assert_eq!(parsed, d);
    }
}
