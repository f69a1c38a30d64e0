//! Tree node header, grounded in `original_source/btrfs_recon/structure/header.py`
//! and `pegasusheavy-btrf-mount-windows/src/core/tree.rs`'s `NODE_HEADER_SIZE`
//! layout.

use crate::error::Result;
use crate::schema::{read_array, read_u64_le, read_u8, write_array, write_u64_le, write_u8};
use crate::schema::{read_fsid_legacy, read_uuid_legacy, write_uuid_legacy};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};
use uuid::Uuid;

use super::{CSUM_SIZE, FSID_SIZE, UUID_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub csum: [u8; CSUM_SIZE],
    pub fsid: Uuid,
    pub bytenr: u64,
    pub flags: u64,
    pub chunk_tree_uuid: Uuid,
    pub generation: u64,
    pub owner: u64,
    pub nritems: u32,
    pub level: u8,
}

impl Header {
    pub const SIZE: usize = CSUM_SIZE + FSID_SIZE + 8 + 8 + UUID_SIZE + 8 + 8 + 4 + 1;
}

impl FromCursor for Header {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let csum: [u8; CSUM_SIZE] = read_array(cur, &ctx.child("csum").path)?;
        let fsid = read_fsid_legacy(cur, &ctx.child("fsid").path)?;
        let bytenr = read_u64_le(cur, &ctx.child("bytenr").path)?;
        let flags = read_u64_le(cur, &ctx.child("flags").path)?;
        let chunk_tree_uuid = read_uuid_legacy(cur, &ctx.child("chunk_tree_uuid").path)?;
        let generation = read_u64_le(cur, &ctx.child("generation").path)?;
        let owner = read_u64_le(cur, &ctx.child("owner").path)?;
        let nritems = crate::schema::read_u32_le(cur, &ctx.child("nritems").path)?;
        let level = read_u8(cur, &ctx.child("level").path)?;
        Ok(Header {
            csum,
            fsid,
            bytenr,
            flags,
            chunk_tree_uuid,
            generation,
            owner,
            nritems,
            level,
        })
    }
}

impl ToBytes for Header {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        write_array(out, &self.csum);
        write_uuid_legacy(out, &self.fsid);
        write_u64_le(out, self.bytenr);
        write_u64_le(out, self.flags);
        write_uuid_legacy(out, &self.chunk_tree_uuid);
        write_u64_le(out, self.generation);
        write_u64_le(out, self.owner);
        crate::schema::write_u32_le(out, self.nritems);
        write_u8(out, self.level);
        let _ = ctx;
        Ok(())
    }
}

impl Header {
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            csum: [0u8; CSUM_SIZE],
            fsid: Uuid::parse_str("bba692f7-5be7-4173-bc27-bb3e21644739").unwrap(),
            bytenr: 65536,
            flags: 0,
            chunk_tree_uuid: Uuid::nil(),
            generation: 2907003,
            owner: 5,
            nritems: 12,
            level: 0,
        }
    }

    #[test]
    fn header_roundtrip() {
        let h = sample();
        let mut buf = Vec::new();
        h.build(&mut buf, &BuildCtx::default()).unwrap();
        assert_eq!(buf.len(), Header::SIZE);
        let mut cur = Cursor::new(&buf);
        let parsed = Header::parse(&mut cur, &ParseCtx::root()).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn level_zero_is_leaf() {
        assert!(sample().is_leaf());
    }
}
