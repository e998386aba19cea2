//! Inner (branch) node: up to 16 children indexed by nibble, a copy-on-write
//! version stamp, and a lazily-computed hash that's invalidated on every
//! write.

use crate::hashing;
use crate::node::children::NodeChildren;
use crate::node::Node;
use crate::options::CollapseMode;
use catl_types::Hash256;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct InnerNode {
    pub(crate) depth: u8,
    version: AtomicU64,
    cow_enabled: bool,
    children: RwLock<NodeChildren>,
    cached_hash: RwLock<Option<Hash256>>,
}

impl InnerNode {
    pub fn new(depth: u8, version: u64, cow_enabled: bool) -> Self {
        Self {
            depth,
            version: AtomicU64::new(version),
            cow_enabled,
            children: RwLock::new(NodeChildren::empty()),
            cached_hash: RwLock::new(None),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn cow_enabled(&self) -> bool {
        self.cow_enabled
    }

    /// Whether a write bound for `target_version` must clone this node
    /// first rather than mutate it in place: a node belongs to whichever
    /// version last wrote it, and is only safe to mutate in place by that
    /// same version. A non-CoW node (used in tests and in bulk-load paths)
    /// always answers `false`.
    pub fn needs_copy(&self, target_version: u64) -> bool {
        self.cow_enabled && self.version() != target_version
    }

    pub fn child(&self, branch: u8) -> Option<Node> {
        self.children.read().get(branch).cloned()
    }

    pub fn children_snapshot(&self) -> Vec<Node> {
        self.children.read().nodes().to_vec()
    }

    pub fn entries(&self) -> Vec<(u8, Node)> {
        self.children.read().entries()
    }

    pub fn only_child(&self) -> Option<(u8, Node)> {
        self.children
            .read()
            .only_child()
            .map(|(b, n)| (b, n.clone()))
    }

    pub fn child_count(&self) -> u32 {
        self.children.read().count()
    }

    pub fn mask(&self) -> u16 {
        self.children.read().mask()
    }

    pub fn set_child(&self, branch: u8, node: Node) {
        self.children.write().set(branch, node);
        self.invalidate_hash();
    }

    pub fn remove_child(&self, branch: u8) -> Option<Node> {
        let removed = self.children.write().remove(branch);
        if removed.is_some() {
            self.invalidate_hash();
        }
        removed
    }

    pub fn invalidate_hash(&self) {
        *self.cached_hash.write() = None;
    }

    /// Clones this node's children under a new version stamp for the CoW
    /// path-copy step. The returned node is a fresh, unshared object the
    /// caller may mutate freely.
    pub fn copy_with_version(&self, new_version: u64) -> InnerNode {
        InnerNode {
            depth: self.depth,
            version: AtomicU64::new(new_version),
            cow_enabled: self.cow_enabled,
            children: RwLock::new(self.children.read().clone()),
            cached_hash: RwLock::new(*self.cached_hash.read()),
        }
    }

    pub fn hash(&self, mode: CollapseMode) -> Hash256 {
        if let Some(h) = *self.cached_hash.read() {
            return h;
        }
        if self.children.read().is_empty() {
            let h = Hash256::zero();
            *self.cached_hash.write() = Some(h);
            return h;
        }
        let mut parts = [Hash256::zero(); 16];
        {
            let children = self.children.read();
            for branch in children.branches() {
                if let Some(child) = children.get(branch) {
                    parts[branch as usize] = hashing::child_hash(self.depth, child, mode);
                }
            }
        }
        let h = hashing::hash_inner_children(&parts);
        *self.cached_hash.write() = Some(h);
        h
    }
}

#[cfg(test)]
mod inner_test;
