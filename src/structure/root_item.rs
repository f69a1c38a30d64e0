//! Root item, grounded in `original_source/btrfs_recon/structure/root_item.py`.
//!
//! Open question: one candidate layout trims the trailing
//! reserved area to `global_tree_id: u64` + `reserved: [u64; 7]`, reflecting
//! a kernel version that repurposed one reserved slot. This crate follows
//! `original_source` (eight plain reserved u64s) since the distilled field list is silent on
//! which kernel revision the forensic target is expected to match and the
//! older layout is the safer default for "damaged, possibly old" images —
//! see DESIGN.md.

use crate::error::Result;
use crate::schema::bitflags_field::le_bitflags;
use crate::schema::{read_u64_le, read_u8, write_u64_le, write_u8};
use crate::schema::{read_uuid_legacy, write_uuid_legacy};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};
use uuid::Uuid;

use super::inode::{InodeItem, Timespec};
use super::key::Key;

le_bitflags! {
    pub struct RootItemFlags: u64 {
        const SUBVOL_RDONLY = 1 << 0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootItem {
    pub inode: InodeItem,
    pub generation: u64,
    pub root_dirid: u64,
    pub bytenr: u64,
    pub byte_limit: u64,
    pub bytes_used: u64,
    pub last_snapshot: u64,
    pub flags: RootItemFlags,
    pub refs: u32,
    pub drop_progress: Key,
    pub drop_level: u8,
    pub level: u8,
    pub generation_v2: u64,
    pub uuid: Uuid,
    pub parent_uuid: Uuid,
    pub received_uuid: Uuid,
    pub ctransid: u64,
    pub otransid: u64,
    pub stransid: u64,
    pub rtransid: u64,
    pub ctime: Timespec,
    pub otime: Timespec,
    pub stime: Timespec,
    pub rtime: Timespec,
    pub reserved: [u64; 8],
}

impl FromCursor for RootItem {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let inode = InodeItem::parse(cur, &ctx.child("inode"))?;
        let generation = read_u64_le(cur, &ctx.child("generation").path)?;
        let root_dirid = read_u64_le(cur, &ctx.child("root_dirid").path)?;
        let bytenr = read_u64_le(cur, &ctx.child("bytenr").path)?;
        let byte_limit = read_u64_le(cur, &ctx.child("byte_limit").path)?;
        let bytes_used = read_u64_le(cur, &ctx.child("bytes_used").path)?;
        let last_snapshot = read_u64_le(cur, &ctx.child("last_snapshot").path)?;
        let flags = RootItemFlags::from_bits_truncate(read_u64_le(cur, &ctx.child("flags").path)?);
        let refs = crate::schema::read_u32_le(cur, &ctx.child("refs").path)?;
        let drop_progress = Key::parse(cur, &ctx.child("drop_progress"))?;
        let drop_level = read_u8(cur, &ctx.child("drop_level").path)?;
        let level = read_u8(cur, &ctx.child("level").path)?;
        let generation_v2 = read_u64_le(cur, &ctx.child("generation_v2").path)?;
        let uuid = read_uuid_legacy(cur, &ctx.child("uuid").path)?;
        let parent_uuid = read_uuid_legacy(cur, &ctx.child("parent_uuid").path)?;
        let received_uuid = read_uuid_legacy(cur, &ctx.child("received_uuid").path)?;
        let ctransid = read_u64_le(cur, &ctx.child("ctransid").path)?;
        let otransid = read_u64_le(cur, &ctx.child("otransid").path)?;
        let stransid = read_u64_le(cur, &ctx.child("stransid").path)?;
        let rtransid = read_u64_le(cur, &ctx.child("rtransid").path)?;
        let ctime = Timespec::parse(cur, &ctx.child("ctime"))?;
        let otime = Timespec::parse(cur, &ctx.child("otime"))?;
        let stime = Timespec::parse(cur, &ctx.child("stime"))?;
        let rtime = Timespec::parse(cur, &ctx.child("rtime"))?;
        let mut reserved = [0u64; 8];
        for r in reserved.iter_mut() {
            *r = read_u64_le(cur, &ctx.child("reserved").path)?;
        }
        Ok(RootItem {
            inode,
            generation,
            root_dirid,
            bytenr,
            byte_limit,
            bytes_used,
            last_snapshot,
            flags,
            refs,
            drop_progress,
            drop_level,
            level,
            generation_v2,
            uuid,
            parent_uuid,
            received_uuid,
            ctransid,
            otransid,
            stransid,
            rtransid,
            ctime,
            otime,
            stime,
            rtime,
            reserved,
        })
    }
}

impl ToBytes for RootItem {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        self.inode.build(out, ctx)?;
        write_u64_le(out, self.generation);
        write_u64_le(out, self.root_dirid);
        write_u64_le(out, self.bytenr);
        write_u64_le(out, self.byte_limit);
        write_u64_le(out, self.bytes_used);
        write_u64_le(out, self.last_snapshot);
        write_u64_le(out, self.flags.bits());
        crate::schema::write_u32_le(out, self.refs);
        self.drop_progress.build(out, ctx)?;
        write_u8(out, self.drop_level);
        write_u8(out, self.level);
        write_u64_le(out, self.generation_v2);
        write_uuid_legacy(out, &self.uuid);
        write_uuid_legacy(out, &self.parent_uuid);
        write_uuid_legacy(out, &self.received_uuid);
        write_u64_le(out, self.ctransid);
        write_u64_le(out, self.otransid);
        write_u64_le(out, self.stransid);
        write_u64_le(out, self.rtransid);
        self.ctime.build(out, ctx)?;
        self.otime.build(out, ctx)?;
        self.stime.build(out, ctx)?;
        self.rtime.build(out, ctx)?;
        for r in self.reserved {
            write_u64_le(out, r);
        }
        Ok(())
    }
}
