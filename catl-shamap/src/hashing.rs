//! Hash computation over (possibly collapsed) inner-node chains.
//!
//! A collapsed tree never materializes an inner node that would have had
//! exactly one child, so a physical child pointer may sit several nibbles
//! below the depth its parent would naively expect. To still produce the
//! same root hash a fully expanded (uncollapsed) tree would, the elided
//! single-child inner nodes are reconstructed on the fly — the "synthetic
//! chain" — and hashed bottom-up, one per skipped depth.

use crate::node::{InnerNode, Node};
use crate::options::CollapseMode;
use catl_types::hash::{hash_with_prefix, INNER_PREFIX};
use catl_types::{Hash256, Key256};

/// The hash a child contributes to its parent's inner hash, accounting for
/// any collapsed gap between the parent's depth and the child's actual
/// depth.
pub(crate) fn child_hash(parent_depth: u8, child: &Node, mode: CollapseMode) -> Hash256 {
    match child {
        Node::Leaf(leaf) => leaf.hash(),
        Node::Inner(inner) => {
            let own_hash = inner.hash(mode);
            let gap = inner.depth().saturating_sub(parent_depth + 1);
            if gap == 0 || !mode.collapses_inner_chains() {
                own_hash
            } else {
                synthetic_chain_hash(inner, own_hash, gap)
            }
        }
    }
}

/// Wraps `hash` in one single-child synthetic inner hash per skipped depth,
/// walking from the real child's depth back up to the parent's depth + 1.
fn synthetic_chain_hash(real_child: &InnerNode, mut hash: Hash256, gap: u8) -> Hash256 {
    let Some(key) = representative_key(real_child) else {
        // An empty subtree has nothing to synthesize a branch path from;
        // this shouldn't arise in practice since an inner node with a
        // collapsed gap always has exactly one (non-empty) child chain
        // beneath it, but fall back to the un-chained hash rather than
        // panic on a corrupt or hand-built tree.
        return hash;
    };
    for step in 1..=gap {
        let synthetic_depth = real_child.depth() - step;
        let branch = key.nibble(synthetic_depth as u16).unwrap_or(0);
        let mut parts = [Hash256::zero(); 16];
        parts[branch as usize] = hash;
        hash = hash_inner_children(&parts);
    }
    hash
}

/// Descends the leftmost (lowest-branch) child chain to find any key that
/// passes through `node`'s subtree, used only to recover the nibble path a
/// synthetic chain's elided inner nodes would have branched on.
fn representative_key(node: &InnerNode) -> Option<Key256> {
    let children = node.children_snapshot();
    match children.first()? {
        Node::Leaf(leaf) => Some(leaf.item.key),
        Node::Inner(inner) => representative_key(inner),
    }
}

pub(crate) fn hash_inner_children(children: &[Hash256; 16]) -> Hash256 {
    let refs: Vec<&[u8]> = children.iter().map(|h| h.as_bytes().as_slice()).collect();
    hash_with_prefix(&INNER_PREFIX, &refs)
}

#[cfg(test)]
mod hashing_test;
