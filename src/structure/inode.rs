//! Inode item / inode ref, grounded in `original_source/btrfs_recon/structure/inode.py`.
//!
//! Timestamps (open question): the original tolerates out-of-range
//! `(sec, nsec)` pairs rather than raising, so this crate keeps them as a
//! plain `(i64, u32)` pair instead of converting eagerly to a calendar type —
//! nothing downstream needs a `DateTime`, and no datetime crate is reached
//! for elsewhere in this codebase.

use crate::error::Result;
use crate::schema::bitflags_field::le_bitflags;
use crate::schema::{read_i64_le, read_u32_le, read_u64_le, write_i64_le, write_u32_le, write_u64_le};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};

le_bitflags! {
    pub struct InodeItemFlags: u64 {
        const NODATASUM = 1 << 0;
        const NODATACOW = 1 << 1;
        const READONLY = 1 << 2;
        const NOCOMPRESS = 1 << 3;
        const PREALLOC = 1 << 4;
        const SYNC = 1 << 5;
        const IMMUTABLE = 1 << 6;
        const APPEND = 1 << 7;
        const NODUMP = 1 << 8;
        const NOATIME = 1 << 9;
        const DIRSYNC = 1 << 10;
        const COMPRESS = 1 << 11;
    }
}

/// Raw `(seconds, nanoseconds)` on-disk timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: u32,
}

impl FromCursor for Timespec {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let sec = read_i64_le(cur, &ctx.child("sec").path)?;
        let nsec = read_u32_le(cur, &ctx.child("nsec").path)?;
        Ok(Timespec { sec, nsec })
    }
}

impl ToBytes for Timespec {
    fn build(&self, out: &mut Vec<u8>, _ctx: &BuildCtx) -> Result<()> {
        write_i64_le(out, self.sec);
        write_u32_le(out, self.nsec);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeItem {
    pub generation: u64,
    pub transid: u64,
    pub size: u64,
    pub nbytes: u64,
    pub block_group: u64,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    pub rdev: u64,
    pub flags: InodeItemFlags,
    pub sequence: u64,
    pub reserved: [u64; 4],
    pub atime: Timespec,
    pub ctime: Timespec,
    pub mtime: Timespec,
    pub otime: Timespec,
}

impl FromCursor for InodeItem {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let generation = read_u64_le(cur, &ctx.child("generation").path)?;
        let transid = read_u64_le(cur, &ctx.child("transid").path)?;
        let size = read_u64_le(cur, &ctx.child("size").path)?;
        let nbytes = read_u64_le(cur, &ctx.child("nbytes").path)?;
        let block_group = read_u64_le(cur, &ctx.child("block_group").path)?;
        let nlink = read_u32_le(cur, &ctx.child("nlink").path)?;
        let uid = read_u32_le(cur, &ctx.child("uid").path)?;
        let gid = read_u32_le(cur, &ctx.child("gid").path)?;
        let mode = read_u32_le(cur, &ctx.child("mode").path)?;
        let rdev = read_u64_le(cur, &ctx.child("rdev").path)?;
        let flags = InodeItemFlags::from_bits_truncate(read_u64_le(cur, &ctx.child("flags").path)?);
        let sequence = read_u64_le(cur, &ctx.child("sequence").path)?;
        let mut reserved = [0u64; 4];
        for r in reserved.iter_mut() {
            *r = read_u64_le(cur, &ctx.child("reserved").path)?;
        }
        let atime = Timespec::parse(cur, &ctx.child("atime"))?;
        let ctime = Timespec::parse(cur, &ctx.child("ctime"))?;
        let mtime = Timespec::parse(cur, &ctx.child("mtime"))?;
        let otime = Timespec::parse(cur, &ctx.child("otime"))?;
        Ok(InodeItem {
            generation,
            transid,
            size,
            nbytes,
            block_group,
            nlink,
            uid,
            gid,
            mode,
            rdev,
            flags,
            sequence,
            reserved,
            atime,
            ctime,
            mtime,
            otime,
        })
    }
}

impl ToBytes for InodeItem {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.generation);
        write_u64_le(out, self.transid);
        write_u64_le(out, self.size);
        write_u64_le(out, self.nbytes);
        write_u64_le(out, self.block_group);
        write_u32_le(out, self.nlink);
        write_u32_le(out, self.uid);
        write_u32_le(out, self.gid);
        write_u32_le(out, self.mode);
        write_u64_le(out, self.rdev);
        write_u64_le(out, self.flags.bits());
        write_u64_le(out, self.sequence);
        for r in self.reserved {
            write_u64_le(out, r);
        }
        self.atime.build(out, ctx)?;
        self.ctime.build(out, ctx)?;
        self.mtime.build(out, ctx)?;
        self.otime.build(out, ctx)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeRef {
    pub index: u64,
    pub name: String,
}

impl FromCursor for InodeRef {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let index = read_u64_le(cur, &ctx.child("index").path)?;
        let name_len = crate::schema::read_u16_le(cur, &ctx.child("name_len").path)?;
        let bytes = crate::schema::read_bytes(cur, &ctx.child("name").path, name_len as usize)?;
        let name = String::from_utf8_lossy(bytes).into_owned();
        Ok(InodeRef { index, name })
    }
}

impl ToBytes for InodeRef {
    fn build(&self, out: &mut Vec<u8>, _ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.index);
        crate::schema::write_u16_le(out, self.name.len() as u16);
        out.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}
