use super::*;
use crate::node::leaf::LeafNode;
use catl_types::{Item, Key256, NodeType};
use std::sync::Arc;

fn leaf(first_byte: u8, second_byte: u8) -> Node {
    let mut bytes = [0u8; 32];
    bytes[0] = first_byte;
    bytes[1] = second_byte;
    Node::new_leaf(LeafNode::new(
        Item::new(Key256::from_bytes(bytes), vec![second_byte]),
        NodeType::AccountState,
    ))
}

/// A collapsed inner node sitting 2 nibbles below where its parent would
/// naively expect it must hash identically to the fully expanded chain of
/// single-child inners it replaces.
#[test]
fn collapsed_chain_matches_fully_expanded_chain() {
    // nibble(0)=5, nibble(1)=5, nibble(2)=5 shared; nibble(3) = 0xA or 0xB.
    let leaf_a = leaf(0x55, 0xA0);
    let leaf_b = leaf(0x55, 0xB0);

    let child = InnerNode::new(3, 1, true);
    child.set_child(0xA, leaf_a.clone());
    child.set_child(0xB, leaf_b.clone());
    let child_node = Node::Inner(Arc::new(child));

    let collapsed_parent = InnerNode::new(0, 1, true);
    collapsed_parent.set_child(5, child_node.clone());

    let mid2 = InnerNode::new(2, 1, true);
    mid2.set_child(5, child_node);
    let mid1 = InnerNode::new(1, 1, true);
    mid1.set_child(5, Node::Inner(Arc::new(mid2)));
    let expanded_parent = InnerNode::new(0, 1, true);
    expanded_parent.set_child(5, Node::Inner(Arc::new(mid1)));

    assert_eq!(
        collapsed_parent.hash(CollapseMode::LeafsAndInners),
        expanded_parent.hash(CollapseMode::LeafsAndInners)
    );
}

#[test]
fn without_inner_chain_collapsing_a_gap_is_hashed_without_synthesizing() {
    let leaf_a = leaf(0x55, 0xA0);
    let child = InnerNode::new(3, 1, true);
    child.set_child(0xA, leaf_a);
    let child_node = Node::Inner(Arc::new(child));

    let parent = InnerNode::new(0, 1, true);
    parent.set_child(5, child_node.clone());

    // `CollapseMode::None` hashes the child directly with no synthetic
    // wrapping, regardless of the depth gap.
    let direct = child_node.hash(CollapseMode::None);
    assert_eq!(child_hash(0, &child_node, CollapseMode::None), direct);
}
