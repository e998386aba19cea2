//! `NodeRef`: a branch slot that may resolve to either an mmap-resident node
//! (read-only, borrowed from a [`CatalogueReader`]'s mapping) or a
//! heap-resident one (mutable, ref-counted, built by
//! [`crate::map::HybridMap::materialize_path_for_key`]). Every `set_item` or
//! `remove_item` call materializes the path to its key before touching
//! anything, so only `HeapInner`s are ever mutated directly.
//!
//! `MmapPlaceholder`/`HeapPlaceholder` exist for symmetry with the wire
//! format's reserved `Placeholder` child type, but this workspace's writer
//! never emits one — every traversal that hits a placeholder treats it as
//! `catl-v2`'s reader already does, surfacing `Error::CorruptFile` rather
//! than silently treating it as absent.

use crate::heap::{HeapInner, HeapLeaf, HeapPlaceholder};
use catl_types::{Error, Hash256, Result};
use catl_v2::CatalogueReader;
use std::sync::Arc;

/// A non-owning pointer into an mmap'd v2 catalogue: which reader it
/// belongs to, and the byte offset of the node's header within that
/// reader's mapping.
#[derive(Clone)]
pub struct MmapNode {
    pub reader: Arc<CatalogueReader>,
    pub offset: u64,
}

#[derive(Clone)]
pub enum NodeRef {
    Empty,
    MmapInner(MmapNode),
    MmapLeaf(MmapNode),
    MmapPlaceholder(MmapNode),
    HeapInner(Arc<HeapInner>),
    HeapLeaf(Arc<HeapLeaf>),
    HeapPlaceholder(Arc<HeapPlaceholder>),
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    pub fn is_mmap(&self) -> bool {
        matches!(
            self,
            NodeRef::MmapInner(_) | NodeRef::MmapLeaf(_) | NodeRef::MmapPlaceholder(_)
        )
    }

    /// This node's own hash: trusted directly off disk for mmap variants
    /// (the writer already computed and cached it), computed-and-cached for
    /// heap variants. Never applies collapsed-gap synthesis — that only
    /// matters when this hash is being folded into a *parent's* inner hash;
    /// see `crate::hashing::child_contribution`.
    pub fn get_hash(&self) -> Result<Hash256> {
        match self {
            NodeRef::Empty => Ok(Hash256::zero()),
            NodeRef::MmapInner(m) => Ok(m.reader.decode_inner_at(m.offset)?.hash),
            NodeRef::MmapLeaf(m) => Ok(m.reader.decode_leaf_at(m.offset)?.0.hash),
            NodeRef::MmapPlaceholder(_) => Err(Error::CorruptFile(
                "attempted to hash a placeholder; the v2 wire format carries no placeholder record to read a hash from".into(),
            )),
            NodeRef::HeapInner(h) => h.hash(),
            NodeRef::HeapLeaf(h) => Ok(h.hash()),
            NodeRef::HeapPlaceholder(h) => Ok(h.hash),
        }
    }
}

#[cfg(test)]
mod node_ref_test;
