//! Tree node: header plus either leaf items (`level == 0`) or internal
//! key-pointers — grounded in `original_source/btrfs_recon/structure/tree_node.py`'s
//! `IfThenElse(level == 0, LeafItem[nritems], KeyPtr[nritems])`.

use crate::error::Result;
use crate::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};

use super::header::Header;
use super::key::KeyPtr;
use super::leaf_item::LeafItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    Leaf(Vec<LeafItem>),
    Internal(Vec<KeyPtr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub header: Header,
    pub body: NodeBody,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf(_))
    }
}

impl FromCursor for TreeNode {
    fn parse(cur: &mut Cursor, ctx: &ParseCtx) -> Result<Self> {
        let header = Header::parse(cur, &ctx.child("header"))?;
        let header_end = Header::SIZE as u64;
        let body = if header.level == 0 {
            let mut items = Vec::with_capacity(header.nritems as usize);
            for i in 0..header.nritems as usize {
                items.push(LeafItem::parse_at(cur, &ctx.child(&format!("items[{i}]")), header_end)?);
            }
            NodeBody::Leaf(items)
        } else {
            let mut ptrs = Vec::with_capacity(header.nritems as usize);
            for i in 0..header.nritems as usize {
                ptrs.push(KeyPtr::parse(cur, &ctx.child(&format!("ptrs[{i}]")))?);
            }
            NodeBody::Internal(ptrs)
        };
        Ok(TreeNode { header, body })
    }
}

impl ToBytes for TreeNode {
    fn build(&self, out: &mut Vec<u8>, ctx: &BuildCtx) -> Result<()> {
        self.header.build(out, ctx)?;
        match &self.body {
            NodeBody::Leaf(items) => {
                for item in items {
                    item.build_header(out, ctx)?;
                }
                for item in items {
                    item.build_payload(out, ctx)?;
                }
            }
            NodeBody::Internal(ptrs) => {
                for ptr in ptrs {
                    ptr.build(out, ctx)?;
                }
            }
        }
        Ok(())
    }
}
