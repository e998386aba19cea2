//! `HybridMap`: a mutable trie rooted at either an mmap subtree (freshly
//! opened from a v2 catalogue) or a heap subtree (after any mutation),
//! reading straight through mmap-resident branches until a write forces
//! materialization (§4.10).

use crate::heap::{HeapInner, HeapLeaf};
use crate::node_ref::{MmapNode, NodeRef};
use catl_types::key::find_divergence;
use catl_types::{Error, Hash256, Item, Key256, NodeType, Result};
use catl_v2::wire::{self, ChildType};
use catl_v2::CatalogueReader;
use std::sync::Arc;

pub struct HybridMap {
    root: NodeRef,
    node_type: NodeType,
}

impl HybridMap {
    /// An empty, fully heap-resident map (no mmap backing at all).
    pub fn new_empty(node_type: NodeType) -> Self {
        Self {
            root: NodeRef::HeapInner(Arc::new(HeapInner::new(0))),
            node_type,
        }
    }

    /// Roots this map at `seq`'s state tree in `reader`.
    pub fn open_state(reader: Arc<CatalogueReader>, seq: u32) -> Result<Self> {
        let (state_abs, _) = reader.tree_roots_for_seq(seq)?;
        Ok(Self {
            root: NodeRef::MmapInner(MmapNode {
                reader,
                offset: state_abs,
            }),
            node_type: NodeType::AccountState,
        })
    }

    /// Roots this map at `seq`'s transaction tree in `reader`.
    pub fn open_tx(reader: Arc<CatalogueReader>, seq: u32) -> Result<Self> {
        let (_, tx_abs) = reader.tree_roots_for_seq(seq)?;
        Ok(Self {
            root: NodeRef::MmapInner(MmapNode {
                reader,
                offset: tx_abs,
            }),
            node_type: NodeType::TxNoMeta,
        })
    }

    pub fn root_hash(&self) -> Result<Hash256> {
        self.root.get_hash()
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Read-only lookup; never materializes anything, so it's safe to call
    /// concurrently with other readers of the same (unmutated) map.
    pub fn get_item(&self, key: Key256) -> Result<Option<Vec<u8>>> {
        Self::get_rec(&self.root, key)
    }

    fn get_rec(node: &NodeRef, key: Key256) -> Result<Option<Vec<u8>>> {
        match node {
            NodeRef::Empty => Ok(None),
            NodeRef::HeapLeaf(l) => Ok(if l.item.key == key {
                Some(l.item.data.as_bytes().to_vec())
            } else {
                None
            }),
            NodeRef::MmapLeaf(m) => {
                let (leaf, payload) = m.reader.decode_leaf_at(m.offset)?;
                if leaf.key == key {
                    Ok(Some(m.reader.decode_leaf_payload(&leaf, payload)?))
                } else {
                    Ok(None)
                }
            }
            NodeRef::HeapPlaceholder(_) | NodeRef::MmapPlaceholder(_) => Err(
                Error::CorruptFile("attempted a read through a placeholder".into()),
            ),
            NodeRef::HeapInner(inner) => {
                let branch = key.nibble(inner.depth() as u16)?;
                Self::get_rec(&inner.child(branch), key)
            }
            NodeRef::MmapInner(m) => {
                let header = m.reader.decode_inner_at(m.offset)?;
                let branch = key.nibble(header.depth as u16)?;
                match wire::get_child_type(header.child_types, branch) {
                    ChildType::Empty => Ok(None),
                    ChildType::Placeholder => Err(Error::CorruptFile(format!(
                        "attempted traversal through a placeholder at branch {branch}"
                    ))),
                    ChildType::Leaf => {
                        let abs = m.reader.child_offset(m.offset, &header, branch)?;
                        let (leaf, payload) = m.reader.decode_leaf_at(abs)?;
                        if leaf.key == key {
                            Ok(Some(m.reader.decode_leaf_payload(&leaf, payload)?))
                        } else {
                            Ok(None)
                        }
                    }
                    ChildType::Inner => {
                        let abs = m.reader.child_offset(m.offset, &header, branch)?;
                        Self::get_rec(
                            &NodeRef::MmapInner(MmapNode {
                                reader: m.reader.clone(),
                                offset: abs,
                            }),
                            key,
                        )
                    }
                }
            }
        }
    }

    /// Materializes every ancestor of `key`'s slot that's still mmap-resident
    /// into an equivalent heap node, so a subsequent `set_item`/`remove_item`
    /// has a fully mutable path to write through. The terminal slot itself is
    /// also converted: a still-mmap leaf becomes a `HeapLeaf` (§4.10's "place
    /// the existing, possibly still mmap, leaf" under a new fork requires a
    /// heap copy to attach it to), while a placeholder or empty slot is left
    /// as-is — a write there is either an error or a fresh insert, neither of
    /// which needs an mmap copy first. As a sanity check (§4.10, scenario
    /// S6), each freshly materialized inner's own freshly computed hash is
    /// compared against the mmap original's stored hash; a mismatch only logs
    /// a warning (a test/debugging hook) rather than failing the call, since
    /// by construction the two must always agree.
    pub fn materialize_path_for_key(&mut self, key: Key256) -> Result<()> {
        let node_type = self.node_type;
        self.root = Self::materialize(self.root.clone(), key, node_type)?;
        Ok(())
    }

    /// Builds an owned `HeapLeaf` copy of an mmap leaf, decompressing its
    /// payload if needed. Used both by `materialize` (to turn a path's
    /// terminal mmap leaf into something `set_rec`/`remove_rec` can write
    /// through) and, on a collision, to fork a still-mmap existing leaf
    /// without losing it.
    fn heap_leaf_from_mmap(m: &MmapNode, node_type: NodeType) -> Result<Arc<HeapLeaf>> {
        let (leaf, payload) = m.reader.decode_leaf_at(m.offset)?;
        let data = m.reader.decode_leaf_payload(&leaf, payload)?;
        Ok(Arc::new(HeapLeaf::new(Item::new(leaf.key, data), node_type)))
    }

    fn materialize(node: NodeRef, key: Key256, node_type: NodeType) -> Result<NodeRef> {
        let NodeRef::MmapInner(m) = &node else {
            return match node {
                NodeRef::HeapInner(inner) => {
                    let branch = key.nibble(inner.depth() as u16)?;
                    let child = inner.child(branch);
                    let materialized = Self::materialize(child, key, node_type)?;
                    inner.set_child(branch, materialized);
                    Ok(NodeRef::HeapInner(inner))
                }
                NodeRef::MmapLeaf(m) => {
                    Ok(NodeRef::HeapLeaf(Self::heap_leaf_from_mmap(&m, node_type)?))
                }
                other => Ok(other),
            };
        };
        let header = m.reader.decode_inner_at(m.offset)?;
        let heap = Arc::new(HeapInner::new(header.depth));
        for branch in 0u8..16 {
            match wire::get_child_type(header.child_types, branch) {
                ChildType::Empty => {}
                ChildType::Placeholder => heap.set_child(
                    branch,
                    NodeRef::MmapPlaceholder(MmapNode {
                        reader: m.reader.clone(),
                        offset: m.offset,
                    }),
                ),
                ChildType::Leaf => {
                    let abs = m.reader.child_offset(m.offset, &header, branch)?;
                    heap.set_child(
                        branch,
                        NodeRef::MmapLeaf(MmapNode {
                            reader: m.reader.clone(),
                            offset: abs,
                        }),
                    );
                }
                ChildType::Inner => {
                    let abs = m.reader.child_offset(m.offset, &header, branch)?;
                    heap.set_child(
                        branch,
                        NodeRef::MmapInner(MmapNode {
                            reader: m.reader.clone(),
                            offset: abs,
                        }),
                    );
                }
            }
        }
        let materialized_hash = heap.hash()?;
        if materialized_hash != header.hash {
            tracing::warn!(
                depth = header.depth,
                expected = %header.hash,
                actual = %materialized_hash,
                "materialized heap node hash diverged from its mmap original"
            );
        }
        if header.depth as u16 >= catl_types::key::KEY_NIBBLES {
            return Ok(NodeRef::HeapInner(heap));
        }
        let branch = key.nibble(header.depth as u16)?;
        let child = heap.child(branch);
        let materialized_child = Self::materialize(child, key, node_type)?;
        heap.set_child(branch, materialized_child);
        Ok(NodeRef::HeapInner(heap))
    }

    /// Inserts or overwrites `key`'s item, materializing its path first.
    pub fn set_item(&mut self, item: Item) -> Result<()> {
        self.materialize_path_for_key(item.key)?;
        let node_type = self.node_type;
        Self::set_rec(&mut self.root, item, node_type, 0)
    }

    fn set_rec(node: &mut NodeRef, item: Item, node_type: NodeType, min_depth: u16) -> Result<()> {
        match node {
            NodeRef::Empty => {
                *node = NodeRef::HeapLeaf(Arc::new(HeapLeaf::new(item, node_type)));
                Ok(())
            }
            NodeRef::HeapLeaf(existing) => {
                if existing.item.key == item.key {
                    *node = NodeRef::HeapLeaf(Arc::new(HeapLeaf::new(item, node_type)));
                    return Ok(());
                }
                let existing_key = existing.item.key;
                let divergence = find_divergence(&existing_key, &item.key, min_depth)?;
                let fork = Arc::new(HeapInner::new(divergence as u8));
                let branch_existing = existing_key.nibble(divergence)?;
                let branch_new = item.key.nibble(divergence)?;
                fork.set_child(branch_existing, node.clone());
                fork.set_child(
                    branch_new,
                    NodeRef::HeapLeaf(Arc::new(HeapLeaf::new(item, node_type))),
                );
                *node = NodeRef::HeapInner(fork);
                Ok(())
            }
            NodeRef::HeapInner(inner) => {
                let branch = item.key.nibble(inner.depth() as u16)?;
                let mut child = inner.child(branch);
                Self::set_rec(&mut child, item, node_type, inner.depth() as u16 + 1)?;
                inner.set_child(branch, child);
                Ok(())
            }
            NodeRef::HeapPlaceholder(_) => Err(Error::CorruptFile(
                "attempted a write through a placeholder".into(),
            )),
            NodeRef::MmapInner(_) | NodeRef::MmapLeaf(_) | NodeRef::MmapPlaceholder(_) => {
                unreachable!(
                    "materialize_path_for_key guarantees the path to `item.key` is heap-resident"
                )
            }
        }
    }

    /// Removes `key`'s item if present, materializing its path first.
    /// Mirrors `catl_shamap::pathfinder::PathFinder::collapse_path`'s
    /// root-never-collapses rule: the top-level call never lets the root
    /// itself be replaced by its only remaining child.
    pub fn remove_item(&mut self, key: Key256) -> Result<bool> {
        self.materialize_path_for_key(key)?;
        let NodeRef::HeapInner(root_inner) = &self.root else {
            unreachable!("materialize_path_for_key always leaves the root as a HeapInner");
        };
        let branch = key.nibble(root_inner.depth() as u16)?;
        let mut child = root_inner.child(branch);
        let removed = Self::remove_rec(&mut child, key)?;
        if removed {
            root_inner.set_child(branch, child);
        }
        Ok(removed)
    }

    fn remove_rec(node: &mut NodeRef, key: Key256) -> Result<bool> {
        match node {
            NodeRef::Empty => Ok(false),
            NodeRef::HeapLeaf(existing) => {
                if existing.item.key == key {
                    *node = NodeRef::Empty;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            NodeRef::HeapInner(inner) => {
                let branch = key.nibble(inner.depth() as u16)?;
                let mut child = inner.child(branch);
                let removed = Self::remove_rec(&mut child, key)?;
                if removed {
                    inner.set_child(branch, child);
                    if let Some((_, only_child)) = inner.only_child() {
                        if matches!(only_child, NodeRef::HeapLeaf(_)) {
                            *node = only_child;
                        }
                    }
                }
                Ok(removed)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod map_test;
