//! Heap-resident hybrid nodes: the mutable, ref-counted half of `NodeRef`.
//! Structurally mirrors `catl_shamap::node::{InnerNode, LeafNode}`, except a
//! `HeapInner`'s children are `NodeRef`s — any mix of still-mmap-resident
//! and already-materialized branches — stored as a fixed `[NodeRef; 16]`
//! rather than the dense bitmap+Vec `NodeChildren` uses, since a hybrid
//! inner's children array is built once at materialization time rather than
//! incrementally populated branch-by-branch from empty.

use crate::node_ref::NodeRef;
use catl_types::hash::{hash_with_prefix, LEAF_NODE_PREFIX, TX_NODE_PREFIX};
use catl_types::{Hash256, Item, NodeType, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

pub struct HeapLeaf {
    pub item: Item,
    pub node_type: NodeType,
    cached_hash: OnceCell<Hash256>,
}

impl HeapLeaf {
    pub fn new(item: Item, node_type: NodeType) -> Self {
        Self {
            item,
            node_type,
            cached_hash: OnceCell::new(),
        }
    }

    /// `h = SHA512/256(prefix || data || key)`, same layout as
    /// `catl_shamap::node::LeafNode::hash`.
    pub fn hash(&self) -> Hash256 {
        *self.cached_hash.get_or_init(|| {
            let prefix = if self.node_type.is_transaction() {
                TX_NODE_PREFIX
            } else {
                LEAF_NODE_PREFIX
            };
            hash_with_prefix(&prefix, &[self.item.data.as_bytes(), self.item.key.as_bytes()])
        })
    }
}

/// A pruned subtree whose hash survives but whose content was never loaded.
/// No constructor in this crate currently produces one from real v2 data —
/// see the `node_ref` module docs — it exists for API completeness with the
/// wire format's reserved `Placeholder` child type.
pub struct HeapPlaceholder {
    pub hash: Hash256,
}

pub struct HeapInner {
    depth: u8,
    children: RwLock<[NodeRef; 16]>,
    cached_hash: RwLock<Option<Hash256>>,
}

impl HeapInner {
    pub fn new(depth: u8) -> Self {
        Self {
            depth,
            children: RwLock::new(std::array::from_fn(|_| NodeRef::Empty)),
            cached_hash: RwLock::new(None),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn child(&self, branch: u8) -> NodeRef {
        self.children.read()[branch as usize].clone()
    }

    pub fn set_child(&self, branch: u8, node: NodeRef) {
        self.children.write()[branch as usize] = node;
        self.invalidate_hash();
    }

    pub fn invalidate_hash(&self) {
        *self.cached_hash.write() = None;
    }

    /// The lone remaining non-empty child and its branch, if exactly one is
    /// set. Drives `HybridMap::remove_item`'s collapse-to-leaf step.
    pub fn only_child(&self) -> Option<(u8, NodeRef)> {
        let children = self.children.read();
        let mut found = None;
        for (branch, child) in children.iter().enumerate() {
            if !child.is_empty() {
                if found.is_some() {
                    return None;
                }
                found = Some((branch as u8, child.clone()));
            }
        }
        found
    }

    /// Descends the leftmost (lowest-branch) child chain to find any key
    /// passing through this subtree — used only to recover the nibble path
    /// a collapsed-gap synthetic chain would have branched on. Mirrors
    /// `catl_shamap::hashing::representative_key`.
    pub(crate) fn representative_key(&self) -> Result<Option<catl_types::Key256>> {
        let children = self.children.read();
        for child in children.iter() {
            match child {
                NodeRef::Empty => continue,
                NodeRef::HeapLeaf(l) => return Ok(Some(l.item.key)),
                NodeRef::MmapLeaf(m) => {
                    return Ok(Some(m.reader.decode_leaf_at(m.offset)?.0.key))
                }
                NodeRef::HeapInner(inner) => return inner.representative_key(),
                NodeRef::MmapInner(m) => return crate::hashing::representative_key_mmap(m),
                NodeRef::HeapPlaceholder(_) | NodeRef::MmapPlaceholder(_) => continue,
            }
        }
        Ok(None)
    }

    /// This inner's own intrinsic hash (no collapsed-gap wrapping applied —
    /// that only happens when a *parent* folds this node's hash into its
    /// own, via `crate::hashing::child_contribution`).
    pub fn hash(&self) -> Result<Hash256> {
        if let Some(h) = *self.cached_hash.read() {
            return Ok(h);
        }
        let mut parts = [Hash256::zero(); 16];
        {
            let children = self.children.read();
            for (branch, child) in children.iter().enumerate() {
                if !child.is_empty() {
                    parts[branch] = crate::hashing::child_contribution(self.depth, child)?;
                }
            }
        }
        let h = crate::hashing::hash_inner_children(&parts);
        *self.cached_hash.write() = Some(h);
        Ok(h)
    }
}

#[cfg(test)]
mod heap_test;
