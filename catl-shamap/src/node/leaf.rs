//! Trie leaf: an opaque item plus a lazily-computed, permanently cached
//! hash. A leaf's content never changes after construction (a "mutation" is
//! always modeled as installing a brand-new leaf at the same slot), so once
//! the hash is computed it's valid for the leaf's entire lifetime.

use catl_types::hash::{hash_with_prefix, LEAF_NODE_PREFIX, TX_NODE_PREFIX};
use catl_types::{Hash256, Item, NodeType};
use once_cell::sync::OnceCell;

pub struct LeafNode {
    pub item: Item,
    pub node_type: NodeType,
    cached_hash: OnceCell<Hash256>,
}

impl LeafNode {
    pub fn new(item: Item, node_type: NodeType) -> Self {
        Self {
            item,
            node_type,
            cached_hash: OnceCell::new(),
        }
    }

    /// `h = SHA512/256(prefix || data || key)`, where `prefix` depends on
    /// whether this leaf belongs to a transaction tree or a state tree.
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

impl Clone for LeafNode {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            node_type: self.node_type,
            cached_hash: self.cached_hash.clone(),
        }
    }
}

#[cfg(test)]
mod leaf_test;
