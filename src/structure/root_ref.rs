//! Root ref/backref item, grounded in `original_source/btrfs_recon/structure/root_ref.py`.

use crate::error::Result;
use crate::schema::{read_bytes, read_u16_le, read_u64_le, write_u16_le, write_u64_le};
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRef {
    pub dirid: u64,
    pub sequence: u64,
    pub name: String,
}

impl FromCursor for RootRef {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let dirid = read_u64_le(cur, &ctx.child("dirid").path)?;
        let sequence = read_u64_le(cur, &ctx.child("sequence").path)?;
        let name_len = read_u16_le(cur, &ctx.child("name_len").path)?;
        let bytes = read_bytes(cur, &ctx.child("name").path, name_len as usize)?;
        let name = String::from_utf8_lossy(bytes).into_owned();
        Ok(RootRef { dirid, sequence, name })
    }
}

impl ToBytes for RootRef {
    fn build(&self, out: &mut Vec<u8>, _ctx: &BuildCtx) -> Result<()> {
        write_u64_le(out, self.dirid);
        write_u64_le(out, self.sequence);
        write_u16_le(out, self.name.len() as u16);
        out.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_ref_roundtrip() {
        let r = RootRef { dirid: 256, sequence: 2, name: "home".to_string() };
        let mut buf = Vec::new();
        r.build(&mut buf, &BuildCtx::default()).unwrap();
        let mut cur = Cursor::new(&buf);
        let parsed = RootRef::parse(&mut cur, &ParseCtx::root()).unwrap();
        assert_eq!(parsed, r);
    }
}
