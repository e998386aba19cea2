use super::*;
use crate::node::leaf::LeafNode;
use crate::options::CollapseMode;
use catl_types::{Hash256, Item, Key256, NodeType};

fn leaf_node(byte: u8) -> Node {
    let key = Key256::from_bytes([byte; 32]);
    Node::new_leaf(LeafNode::new(Item::new(key, vec![byte]), NodeType::AccountState))
}

#[test]
fn needs_copy_is_false_once_version_matches() {
    let node = InnerNode::new(0, 5, true);
    assert!(node.needs_copy(6));
    assert!(!node.needs_copy(5));
}

#[test]
fn cow_disabled_never_requires_a_copy() {
    let node = InnerNode::new(0, 5, false);
    assert!(!node.needs_copy(999));
}

#[test]
fn copy_with_version_carries_children_but_not_identity() {
    let node = InnerNode::new(0, 1, true);
    node.set_child(3, leaf_node(9));
    let copy = node.copy_with_version(2);
    assert_eq!(copy.version(), 2);
    assert!(copy.child(3).is_some());
}

#[test]
fn set_child_invalidates_cached_hash() {
    let node = InnerNode::new(0, 1, true);
    node.set_child(1, leaf_node(1));
    let h1 = node.hash(CollapseMode::None);
    node.set_child(2, leaf_node(2));
    let h2 = node.hash(CollapseMode::None);
    assert_ne!(h1, h2);
}

#[test]
fn empty_inner_hashes_deterministically() {
    let a = InnerNode::new(0, 1, true);
    let b = InnerNode::new(0, 2, true);
    assert_eq!(a.hash(CollapseMode::None), b.hash(CollapseMode::None));
}

#[test]
fn empty_inner_hashes_to_zero() {
    let node = InnerNode::new(0, 1, true);
    assert_eq!(node.hash(CollapseMode::None), Hash256::zero());
}
