//! Chunk item / stripe, grounded in `original_source/btrfs_recon/structure/chunk_item.py`
//! and `pegasusheavy-btrf-mount-windows/src/core/chunk.rs`'s `ChunkMapping`/
//! `Stripe` structs.

use crate::error::Result;
use crate::schema::bitflags_field::le_bitflags;
use crate::schema::{read_u16_le, read_u32_le, read_u64_le, write_u16_le, write_u32_le, write_u64_le};
use crate::schema::{read_uuid_legacy, write_uuid_legacy};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};
use uuid::Uuid;

le_bitflags! {
    pub struct BlockGroupFlags: u64 {
        const DATA = 1 << 0;
        const SYSTEM = 1 << 1;
        const METADATA = 1 << 2;
        const RAID0 = 1 << 3;
        const RAID1 = 1 << 4;
        const DUP = 1 << 5;
        const RAID10 = 1 << 6;
        const RAID5 = 1 << 7;
        const RAID6 = 1 << 8;
        const RAID1C3 = 1 << 9;
        const RAID1C4 = 1 << 10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stripe {
    pub devid: u64,
    pub offset: u64,
    pub dev_uuid: Uuid,
}

impl Stripe {
    pub const SIZE: usize = 8 + 8 + 16;
}

impl FromCursor for Stripe {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let devid = read_u64_le(cur, &ctx.child("devid").path)?;
        let offset = read_u64_le(cur, &ctx.child("offset").path)?;
        let dev_uuid = read_uuid_legacy(cur, &ctx.child("dev_uuid").path)?;
        Ok(Stripe { devid, offset, dev_uuid })
    }
}

impl ToBytes for Stripe {
    fn build(&self, out: &mut Vec<u8>, _ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.devid);
        write_u64_le(out, self.offset);
        write_uuid_legacy(out, &self.dev_uuid);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkItem {
    pub length: u64,
    pub owner: u64,
    pub stripe_len: u64,
    pub ty: BlockGroupFlags,
    pub io_align: u32,
    pub io_width: u32,
    pub sector_size: u32,
    pub num_stripes: u16,
    pub sub_stripes: u16,
    pub stripes: Vec<Stripe>,
}

impl FromCursor for ChunkItem {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let length = read_u64_le(cur, &ctx.child("length").path)?;
        let owner = read_u64_le(cur, &ctx.child("owner").path)?;
        let stripe_len = read_u64_le(cur, &ctx.child("stripe_len").path)?;
        let ty = BlockGroupFlags::from_bits_truncate(read_u64_le(cur, &ctx.child("type").path)?);
        let io_align = read_u32_le(cur, &ctx.child("io_align").path)?;
        let io_width = read_u32_le(cur, &ctx.child("io_width").path)?;
        let sector_size = read_u32_le(cur, &ctx.child("sector_size").path)?;
        let num_stripes = read_u16_le(cur, &ctx.child("num_stripes").path)?;
        let sub_stripes = read_u16_le(cur, &ctx.child("sub_stripes").path)?;
        let stripes = (0..num_stripes as usize)
            .map(|i| Stripe::parse(cur, &ctx.child(&format!("stripes[{i}]"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(ChunkItem {
            length,
            owner,
            stripe_len,
            ty,
            io_align,
            io_width,
            sector_size,
            num_stripes,
            sub_stripes,
            stripes,
        })
    }
}

impl ToBytes for ChunkItem {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.length);
        write_u64_le(out, self.owner);
        write_u64_le(out, self.stripe_len);
        write_u64_le(out, self.ty.bits());
        write_u32_le(out, self.io_align);
        write_u32_le(out, self.io_width);
        write_u32_le(out, self.sector_size);
        write_u16_le(out, self.num_stripes);
        write_u16_le(out, self.sub_stripes);
        for s in &self.stripes {
            s.build(out, ctx)?;
        }
        Ok(())
    }
}
