//! Directory entry item, grounded in `original_source/btrfs_recon/structure/dir_item.py`.

use crate::error::Result;
use crate::schema::enums::{enum_by_value, EnumByValue};
use crate::schema::{read_bytes, read_u16_le, read_u64_le, read_u8, write_u16_le, write_u64_le, write_u8};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};

use super::key::Key;

enum_by_value! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DirEntryType: u8 {
        Unknown0 = 0,
        RegFile = 1,
        Dir = 2,
        ChrDevice = 3,
        BlkDevice = 4,
        Fifo = 5,
        Socket = 6,
        Symlink = 7,
        Xattr = 8,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirItem {
    pub location: Key,
    pub transid: u64,
    pub data_len: u16,
    pub name: String,
    pub ty: DirEntryType,
}

impl FromCursor for DirItem {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let location = Key::parse(cur, &ctx.child("location"))?;
        let transid = read_u64_le(cur, &ctx.child("transid").path)?;
        let data_len = read_u16_le(cur, &ctx.child("data_len").path)?;
        let name_len = read_u16_le(cur, &ctx.child("name_len").path)?;
        let ty = DirEntryType::from_value(read_u8(cur, &ctx.child("type").path)?);
        let name_bytes = read_bytes(cur, &ctx.child("name").path, name_len as usize)?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();
        Ok(DirItem { location, transid, data_len, name, ty })
    }
}

impl ToBytes for DirItem {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        self.location.build(out, ctx)?;
        write_u64_le(out, self.transid);
        write_u16_le(out, self.data_len);
        write_u16_le(out, self.name.len() as u16);
        write_u8(out, self.ty.to_value());
        out.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::key::KeyType;

    #[test]
    fn dir_item_roundtrip() {
        let item = DirItem {
            location: Key { objectid: 257, ty: KeyType::InodeItem, offset: 0 },
            transid: 7,
            data_len: 0,
            name: "subdir".to_string(),
            ty: DirEntryType::Dir,
        };
        let mut buf = Vec::new();
        item.build(&mut buf, &BuildCtx::default()).unwrap();
        let mut cur = Cursor::new(&buf);
        let parsed = DirItem::parse(&mut cur, &ParseCtx::root()).unwrap();
        assert_eq!(parsed, item);
    }
}
