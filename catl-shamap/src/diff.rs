//! Structural diff between two [`SHAMap`] snapshots: which keys were added,
//! removed, or changed value between `before` and `after`. Walks both trees
//! together, pruning any subtree pair that shares the same hash (and, for
//! in-memory trees descended from a common ancestor via CoW, often the same
//! physical node) without descending into it.

use crate::map::SHAMap;
use crate::node::Node;
use crate::options::CollapseMode;
use catl_types::{Item, Key256, Result};
use std::collections::BTreeMap;

/// One item-level change between two trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffEntry {
    Added(Item),
    Removed(Item),
    Modified { before: Item, after: Item },
}

/// All item-level changes between two trees, keyed by trie key for
/// deterministic iteration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diff {
    entries: BTreeMap<Key256, DiffEntry>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &Key256) -> Option<&DiffEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key256, &DiffEntry)> {
        self.entries.iter()
    }

    /// Swaps `Added` for `Removed` and flips the `before`/`after` sides of
    /// every `Modified` entry — the diff that would be produced by diffing
    /// the same two trees in the opposite order.
    pub fn invert(&self) -> Diff {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| {
                let inverted = match v {
                    DiffEntry::Added(item) => DiffEntry::Removed(item.clone()),
                    DiffEntry::Removed(item) => DiffEntry::Added(item.clone()),
                    DiffEntry::Modified { before, after } => DiffEntry::Modified {
                        before: after.clone(),
                        after: before.clone(),
                    },
                };
                (*k, inverted)
            })
            .collect();
        Diff { entries }
    }

    /// Applies this diff's changes onto `target`, turning a tree equal to
    /// `before` into one equal to `after`.
    pub fn apply(&self, target: &mut SHAMap) -> Result<()> {
        use crate::map::SetMode;
        for entry in self.entries.values() {
            match entry {
                DiffEntry::Added(item) => {
                    target.set_item(item.clone(), SetMode::AddOrUpdate)?;
                }
                DiffEntry::Removed(item) => {
                    target.remove_item(item.key)?;
                }
                DiffEntry::Modified { after, .. } => {
                    target.set_item(after.clone(), SetMode::AddOrUpdate)?;
                }
            }
        }
        Ok(())
    }
}

/// Diffs `before` against `after`, descending only where the two subtrees'
/// hashes disagree.
pub fn diff(before: &SHAMap, after: &SHAMap) -> Diff {
    let mode = after.options().collapse;
    let mut entries = BTreeMap::new();
    diff_nodes(&before.root_node(), &after.root_node(), mode, &mut entries);
    Diff { entries }
}

fn diff_nodes(
    before: &Node,
    after: &Node,
    mode: CollapseMode,
    out: &mut BTreeMap<Key256, DiffEntry>,
) {
    if before.ptr_eq(after) {
        return;
    }
    if before.hash(mode) == after.hash(mode) {
        return;
    }
    match (before, after) {
        (Node::Leaf(a), Node::Leaf(b)) => {
            if a.item.key == b.item.key {
                if a.item.data != b.item.data {
                    out.insert(
                        a.item.key,
                        DiffEntry::Modified {
                            before: a.item.clone(),
                            after: b.item.clone(),
                        },
                    );
                }
            } else {
                out.insert(a.item.key, DiffEntry::Removed(a.item.clone()));
                out.insert(b.item.key, DiffEntry::Added(b.item.clone()));
            }
        }
        (Node::Leaf(a), Node::Inner(_)) => {
            match find_item(after, a.item.key) {
                Some(b_item) if b_item.data != a.item.data => {
                    out.insert(
                        a.item.key,
                        DiffEntry::Modified {
                            before: a.item.clone(),
                            after: b_item,
                        },
                    );
                }
                Some(_) => {}
                None => {
                    out.insert(a.item.key, DiffEntry::Removed(a.item.clone()));
                }
            }
            collect_all_except(after, out, Collect::Added, a.item.key);
        }
        (Node::Inner(_), Node::Leaf(b)) => {
            match find_item(before, b.item.key) {
                Some(a_item) if a_item.data != b.item.data => {
                    out.insert(
                        b.item.key,
                        DiffEntry::Modified {
                            before: a_item,
                            after: b.item.clone(),
                        },
                    );
                }
                Some(_) => {}
                None => {
                    out.insert(b.item.key, DiffEntry::Added(b.item.clone()));
                }
            }
            collect_all_except(before, out, Collect::Removed, b.item.key);
        }
        (Node::Inner(a), Node::Inner(b)) => {
            for branch in 0u8..16 {
                match (a.child(branch), b.child(branch)) {
                    (Some(ca), Some(cb)) => diff_nodes(&ca, &cb, mode, out),
                    (Some(ca), None) => collect_all(&ca, out, Collect::Removed),
                    (None, Some(cb)) => collect_all(&cb, out, Collect::Added),
                    (None, None) => {}
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Collect {
    Added,
    Removed,
}

fn collect_all(node: &Node, out: &mut BTreeMap<Key256, DiffEntry>, mode: Collect) {
    match node {
        Node::Leaf(leaf) => {
            let entry = match mode {
                Collect::Added => DiffEntry::Added(leaf.item.clone()),
                Collect::Removed => DiffEntry::Removed(leaf.item.clone()),
            };
            out.insert(leaf.item.key, entry);
        }
        Node::Inner(inner) => {
            for (_, child) in inner.entries() {
                collect_all(&child, out, mode);
            }
        }
    }
}

/// Like [`collect_all`], but skips `except_key` — used when that key was
/// already resolved (as `Modified`, omitted as unchanged, or reported on its
/// own) by the caller, so it isn't also swept up by the blanket collect.
fn collect_all_except(
    node: &Node,
    out: &mut BTreeMap<Key256, DiffEntry>,
    mode: Collect,
    except_key: Key256,
) {
    match node {
        Node::Leaf(leaf) => {
            if leaf.item.key == except_key {
                return;
            }
            let entry = match mode {
                Collect::Added => DiffEntry::Added(leaf.item.clone()),
                Collect::Removed => DiffEntry::Removed(leaf.item.clone()),
            };
            out.insert(leaf.item.key, entry);
        }
        Node::Inner(inner) => {
            for (_, child) in inner.entries() {
                collect_all_except(&child, out, mode, except_key);
            }
        }
    }
}

/// Finds `key`'s item within `node`'s subtree, following nibbles off each
/// inner's own depth (so it works under collapsed inner chains too).
/// Returns `None` if the key isn't present anywhere under `node`.
fn find_item(node: &Node, key: Key256) -> Option<Item> {
    match node {
        Node::Leaf(leaf) => {
            if leaf.item.key == key {
                Some(leaf.item.clone())
            } else {
                None
            }
        }
        Node::Inner(inner) => {
            let branch = key.nibble(inner.depth() as u16).ok()?;
            let child = inner.child(branch)?;
            find_item(&child, key)
        }
    }
}

#[cfg(test)]
mod diff_test;
