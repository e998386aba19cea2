//! The authenticated, copy-on-write trie itself. Every mutation goes
//! through a [`PathFinder`](crate::pathfinder::PathFinder); `SHAMap` owns
//! only the root pointer, the version this handle currently writes as, and
//! the counter shared by every snapshot descended from the same original
//! tree.

use crate::node::{InnerNode, LeafNode, Node};
use crate::options::{CollapseMode, SHAMapOptions};
use crate::pathfinder::PathFinder;
use catl_types::{Hash256, Item, Key256, NodeType, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Whether a write must find the key absent, present, or either.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetMode {
    AddOnly,
    UpdateOnly,
    AddOrUpdate,
}

/// What actually happened as a result of a `set_item` call. Mode-constraint
/// violations (wrong `SetMode` for the key's existence) are reported this
/// way rather than as an `Err`; only structural failures (invalid nibble
/// depth, exhausted trie depth) propagate as errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetResult {
    Added,
    Updated,
    Failed,
}

pub struct SHAMap {
    root: Node,
    current_version: u64,
    shared_counter: Arc<AtomicU64>,
    options: SHAMapOptions,
    node_type: NodeType,
}

impl SHAMap {
    /// A fresh, empty tree whose leaves default to `node_type` (e.g.
    /// `NodeType::AccountState` for a state map, `NodeType::TxNoMeta` for a
    /// transaction map).
    pub fn new(node_type: NodeType) -> Self {
        Self::with_options(node_type, SHAMapOptions::default())
    }

    pub fn with_options(node_type: NodeType, options: SHAMapOptions) -> Self {
        Self {
            root: Node::new_inner(0, 0, options.cow_enabled),
            current_version: 0,
            shared_counter: Arc::new(AtomicU64::new(1)),
            options,
            node_type,
        }
    }

    pub fn options(&self) -> SHAMapOptions {
        self.options
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn root_hash(&self) -> Hash256 {
        self.root.hash(self.options.collapse)
    }

    /// A cheap (reference-counted) clone of the root pointer, for callers
    /// like [`crate::diff`] that need to walk the tree read-only without
    /// going through [`PathFinder`].
    pub fn root_node(&self) -> Node {
        self.root.clone()
    }

    pub fn get_item(&self, key: Key256) -> Result<Option<Item>> {
        let mut current = self.root.clone();
        loop {
            match current {
                Node::Leaf(leaf) => {
                    return Ok(if leaf.item.key == key {
                        Some(leaf.item.clone())
                    } else {
                        None
                    });
                }
                Node::Inner(inner) => {
                    let branch = key.nibble(inner.depth() as u16)?;
                    match inner.child(branch) {
                        Some(child) => current = child,
                        None => return Ok(None),
                    }
                }
            }
        }
    }

    pub fn has_item(&self, key: Key256) -> Result<bool> {
        Ok(self.get_item(key)?.is_some())
    }

    /// `set_item(item, SetMode::AddOnly)`.
    pub fn add_item(&mut self, item: Item) -> Result<SetResult> {
        self.set_item(item, SetMode::AddOnly)
    }

    /// `set_item(item, SetMode::UpdateOnly)`.
    pub fn update_item(&mut self, item: Item) -> Result<SetResult> {
        self.set_item(item, SetMode::UpdateOnly)
    }

    /// Inserts or replaces `item` according to `mode`. Returns
    /// `SetResult::Failed` rather than an `Err` for mode-constraint
    /// violations (adding an existing key under `AddOnly`, updating a
    /// missing one under `UpdateOnly`); an `Err` only ever reflects a
    /// structural failure (e.g. a corrupt nibble depth).
    pub fn set_item(&mut self, item: Item, mode: SetMode) -> Result<SetResult> {
        let target_version = self.current_version;
        let cow_enabled = self.options.cow_enabled;
        let collapse = self.options.collapse;
        let node_type = self.node_type;
        let key = item.key;
        let mut pf = PathFinder::new(&mut self.root, key)?;

        if pf.is_empty_slot() {
            if mode == SetMode::UpdateOnly {
                return Ok(SetResult::Failed);
            }
            pf.dirty_or_copy_inners(target_version);
            pf.set_terminal(Node::new_leaf(LeafNode::new(item, node_type)));
            tracing::trace!(key = %key, "added item to SHAMap");
            return Ok(SetResult::Added);
        }

        if pf.leaf_matches() {
            if mode == SetMode::AddOnly {
                return Ok(SetResult::Failed);
            }
            pf.dirty_or_copy_inners(target_version);
            pf.set_terminal(Node::new_leaf(LeafNode::new(item, node_type)));
            tracing::trace!(key = %key, "updated item in SHAMap");
            return Ok(SetResult::Updated);
        }

        // Terminal is a leaf with a different key: a collision. Absent
        // under `UpdateOnly` semantics; resolved by branching under
        // `AddOnly`/`AddOrUpdate`.
        if mode == SetMode::UpdateOnly {
            return Ok(SetResult::Failed);
        }

        let divergence = pf.divergence_depth()?;
        let existing_leaf = pf.found_leaf().expect("leaf terminal").clone();
        let existing_key = existing_leaf
            .as_leaf()
            .expect("leaf terminal")
            .item
            .key;
        let parent_depth = pf.last_depth();

        let branch_existing = existing_key.nibble(divergence)?;
        let branch_new = key.nibble(divergence)?;
        let mut fork = InnerNode::new(divergence as u8, target_version, cow_enabled);
        fork.set_child(branch_existing, existing_leaf);
        fork.set_child(branch_new, Node::new_leaf(LeafNode::new(item, node_type)));
        let mut current_node = Node::Inner(Arc::new(fork));

        if !collapse.collapses_inner_chains() {
            for depth in (parent_depth as u16 + 1..divergence).rev() {
                let shared_branch = key.nibble(depth)?;
                let mut mid = InnerNode::new(depth as u8, target_version, cow_enabled);
                mid.set_child(shared_branch, current_node);
                current_node = Node::Inner(Arc::new(mid));
            }
        }

        pf.dirty_or_copy_inners(target_version);
        pf.set_terminal(current_node);
        tracing::trace!(key = %key, "added item to SHAMap (collision resolved)");
        Ok(SetResult::Added)
    }

    /// Removes the item at `key`. Returns `false` if the key wasn't
    /// present.
    pub fn remove_item(&mut self, key: Key256) -> Result<bool> {
        let target_version = self.current_version;
        let mut pf = PathFinder::new(&mut self.root, key)?;
        if pf.is_empty_slot() || !pf.leaf_matches() {
            return Ok(false);
        }
        pf.dirty_or_copy_inners(target_version);
        pf.remove_terminal();
        pf.collapse_path(self.options.collapse);
        tracing::trace!(key = %key, "removed item from SHAMap");
        Ok(true)
    }

    /// Freezes this handle at its current version and returns an
    /// independent handle sharing the same tree: both mint a fresh version
    /// from the counter they share, so the next write on either side
    /// path-copies rather than mutating shared structure.
    pub fn snapshot(&mut self) -> SHAMap {
        let mine = self.shared_counter.fetch_add(2, Ordering::SeqCst);
        let theirs = mine + 1;
        self.current_version = mine;
        tracing::debug!(from = self.current_version, to = theirs, "snapshot taken");
        SHAMap {
            root: self.root.clone(),
            current_version: theirs,
            shared_counter: self.shared_counter.clone(),
            options: self.options,
            node_type: self.node_type,
        }
    }

    /// Collapses every single-child inner node in the tree that `collapse`
    /// permits, bottom-up. Used after a bulk, non-CoW load (where
    /// individual removes never had a chance to trigger
    /// `PathFinder::collapse_path`) to bring the tree to canonical shape.
    ///
    /// The physical root is never itself replaced (mirrors
    /// `PathFinder::collapse_path`, which starts its upward walk one level
    /// below the root): only the root's children are recursively
    /// collapsed, even if the root ends up with exactly one child.
    pub fn collapse_tree(&mut self) {
        let Node::Inner(root_inner) = &self.root else {
            unreachable!("SHAMap root is always an Inner node");
        };
        for (branch, child) in root_inner.entries() {
            let collapsed = Self::collapse_rec(child, self.options.collapse);
            root_inner.set_child(branch, collapsed);
        }
    }

    fn collapse_rec(node: Node, mode: CollapseMode) -> Node {
        let inner = match &node {
            Node::Inner(i) => i.clone(),
            Node::Leaf(_) => return node,
        };
        for (branch, child) in inner.entries() {
            let collapsed = Self::collapse_rec(child, mode);
            inner.set_child(branch, collapsed);
        }
        if let Some((_, only)) = inner.only_child() {
            let allowed = match &only {
                Node::Leaf(_) => mode.collapses_leafs(),
                Node::Inner(_) => mode.collapses_inner_chains(),
            };
            if allowed {
                return only;
            }
        }
        node
    }

    /// A recursive debug dump: `{"depth", "hash", "children": {...}}` for
    /// inners, `{"key", "hash"}` for leaves. Not part of the wire format —
    /// purely a `tracing`/test-assertion convenience.
    pub fn trie_json(&self) -> serde_json::Value {
        Self::node_json(&self.root, self.options.collapse)
    }

    fn node_json(node: &Node, mode: CollapseMode) -> serde_json::Value {
        match node {
            Node::Leaf(leaf) => serde_json::json!({
                "type": "leaf",
                "key": leaf.item.key.hex(),
                "hash": leaf.hash().hex(),
            }),
            Node::Inner(inner) => {
                let mut children = serde_json::Map::new();
                for (branch, child) in inner.entries() {
                    children.insert(format!("{branch:x}"), Self::node_json(&child, mode));
                }
                serde_json::json!({
                    "type": "inner",
                    "depth": inner.depth(),
                    "hash": inner.hash(mode).hex(),
                    "children": children,
                })
            }
        }
    }
}

#[cfg(test)]
mod map_test;
