//! Gap-aware inner-hash computation over `NodeRef` children.
//!
//! Reimplements `catl_shamap::hashing`'s collapsed-chain synthesis (rather
//! than calling it directly — those functions are `pub(crate)` to
//! `catl-shamap`, a dev-dependency here, not a runtime one) because the same
//! problem recurs here in a new shape: a `HeapInner`'s child may still be an
//! `MmapInner` whose on-disk depth sits many nibbles below the heap parent's
//! depth, exactly like a collapsed in-memory chain elides intermediate
//! inners. The on-disk hash the v2 writer stored for that child is its own
//! intrinsic hash (computed the same way `InnerNode::hash` computes it, with
//! no reference to a parent) — folding it into a shallower parent's hash
//! still needs the synthetic single-child wrapping for every skipped depth.

use crate::node_ref::{MmapNode, NodeRef};
use catl_types::hash::{hash_with_prefix, INNER_PREFIX};
use catl_types::{Error, Hash256, Key256, Result};
use catl_v2::wire::{self, ChildType};

/// The hash `child` contributes to a parent inner node at `parent_depth`,
/// accounting for any gap between `parent_depth` and the child's actual
/// depth.
pub(crate) fn child_contribution(parent_depth: u8, child: &NodeRef) -> Result<Hash256> {
    match child {
        NodeRef::Empty => Ok(Hash256::zero()),
        NodeRef::HeapLeaf(_) | NodeRef::MmapLeaf(_) => child.get_hash(),
        NodeRef::HeapPlaceholder(_) | NodeRef::MmapPlaceholder(_) => child.get_hash(),
        NodeRef::HeapInner(inner) => {
            let own_hash = inner.hash()?;
            wrap_for_gap(parent_depth, inner.depth(), own_hash, || {
                inner.representative_key()
            })
        }
        NodeRef::MmapInner(m) => {
            let header = m.reader.decode_inner_at(m.offset)?;
            wrap_for_gap(parent_depth, header.depth, header.hash, || {
                representative_key_mmap(m)
            })
        }
    }
}

fn wrap_for_gap(
    parent_depth: u8,
    child_depth: u8,
    mut hash: Hash256,
    representative: impl FnOnce() -> Result<Option<Key256>>,
) -> Result<Hash256> {
    let gap = (child_depth as i16 - parent_depth as i16 - 1).max(0) as u8;
    if gap == 0 {
        return Ok(hash);
    }
    let Some(key) = representative()? else {
        // A subtree with a collapsed gap always has exactly one non-empty
        // child chain beneath it in practice; fall back to the un-chained
        // hash rather than fail on a hand-built or corrupt tree.
        return Ok(hash);
    };
    for step in 1..=gap {
        let synthetic_depth = child_depth - step;
        let branch = key.nibble(synthetic_depth as u16).unwrap_or(0);
        let mut parts = [Hash256::zero(); 16];
        parts[branch as usize] = hash;
        hash = hash_inner_children(&parts);
    }
    Ok(hash)
}

pub(crate) fn hash_inner_children(children: &[Hash256; 16]) -> Hash256 {
    let refs: Vec<&[u8]> = children.iter().map(|h| h.as_bytes().as_slice()).collect();
    hash_with_prefix(&INNER_PREFIX, &refs)
}

/// As `catl_shamap::hashing::representative_key`, but walking an mmap
/// subtree directly via its `CatalogueReader` rather than an in-memory
/// `Node` chain.
pub(crate) fn representative_key_mmap(m: &MmapNode) -> Result<Option<Key256>> {
    let header = m.reader.decode_inner_at(m.offset)?;
    for branch in 0u8..16 {
        match wire::get_child_type(header.child_types, branch) {
            ChildType::Empty => continue,
            ChildType::Placeholder => {
                return Err(Error::CorruptFile(format!(
                    "representative-key walk hit a placeholder at branch {branch}"
                )))
            }
            ChildType::Leaf => {
                let abs = m.reader.child_offset(m.offset, &header, branch)?;
                let (leaf, _) = m.reader.decode_leaf_at(abs)?;
                return Ok(Some(leaf.key));
            }
            ChildType::Inner => {
                let abs = m.reader.child_offset(m.offset, &header, branch)?;
                return representative_key_mmap(&MmapNode {
                    reader: m.reader.clone(),
                    offset: abs,
                });
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod hashing_test;
