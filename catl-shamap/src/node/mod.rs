//! The two physical node kinds a branch pointer can resolve to.

pub mod children;
pub mod inner;
pub mod leaf;

pub use children::NodeChildren;
pub use inner::InnerNode;
pub use leaf::LeafNode;

use crate::options::CollapseMode;
use catl_types::Hash256;
use std::sync::Arc;

/// A branch pointer. Cloning only bumps a reference count — this is the
/// pointer type the whole CoW tree is built out of.
#[derive(Clone)]
pub enum Node {
    Inner(Arc<InnerNode>),
    Leaf(Arc<LeafNode>),
}

impl Node {
    pub fn new_inner(depth: u8, version: u64, cow_enabled: bool) -> Self {
        Node::Inner(Arc::new(InnerNode::new(depth, version, cow_enabled)))
    }

    pub fn new_leaf(leaf: LeafNode) -> Self {
        Node::Leaf(Arc::new(leaf))
    }

    pub fn hash(&self, mode: CollapseMode) -> Hash256 {
        match self {
            Node::Inner(i) => i.hash(mode),
            Node::Leaf(l) => l.hash(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn is_inner(&self) -> bool {
        matches!(self, Node::Inner(_))
    }

    pub fn as_leaf(&self) -> Option<&Arc<LeafNode>> {
        match self {
            Node::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_inner(&self) -> Option<&Arc<InnerNode>> {
        match self {
            Node::Inner(i) => Some(i),
            _ => None,
        }
    }

    /// `Arc::ptr_eq` across either variant; two nodes of different kinds are
    /// never the same object.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Inner(a), Node::Inner(b)) => Arc::ptr_eq(a, b),
            (Node::Leaf(a), Node::Leaf(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
