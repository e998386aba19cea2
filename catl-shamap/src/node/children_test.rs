use super::*;
use crate::node::leaf::LeafNode;
use catl_types::{Item, Key256, NodeType};

fn leaf(byte: u8) -> Node {
    let key = Key256::from_bytes([byte; 32]);
    Node::new_leaf(LeafNode::new(Item::new(key, vec![byte]), NodeType::AccountState))
}

#[test]
fn set_then_get_round_trips() {
    let mut children = NodeChildren::empty();
    children.set(3, leaf(1));
    children.set(9, leaf(2));
    assert!(children.has(3));
    assert!(children.has(9));
    assert!(!children.has(0));
    assert_eq!(children.count(), 2);
}

#[test]
fn mask_tracks_set_branches_in_order() {
    let mut children = NodeChildren::empty();
    children.set(5, leaf(1));
    children.set(1, leaf(2));
    children.set(12, leaf(3));
    let order: Vec<u8> = children.branches().collect();
    assert_eq!(order, vec![1, 5, 12]);
}

#[test]
fn remove_clears_bit_and_shifts_index() {
    let mut children = NodeChildren::empty();
    children.set(2, leaf(1));
    children.set(4, leaf(2));
    children.set(8, leaf(3));
    children.remove(4);
    assert!(!children.has(4));
    assert_eq!(children.count(), 2);
    assert!(children.get(8).is_some());
}

#[test]
fn only_child_reports_none_unless_exactly_one_set() {
    let mut children = NodeChildren::empty();
    assert!(children.only_child().is_none());
    children.set(7, leaf(1));
    assert_eq!(children.only_child().map(|(b, _)| b), Some(7));
    children.set(2, leaf(2));
    assert!(children.only_child().is_none());
}
