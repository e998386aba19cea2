use super::*;
use crate::node::leaf::LeafNode;
use catl_types::{Item, NodeType};

fn key(byte0: u8, byte1: u8) -> Key256 {
    let mut bytes = [0u8; 32];
    bytes[0] = byte0;
    bytes[1] = byte1;
    Key256::from_bytes(bytes)
}

#[test]
fn empty_tree_reports_empty_slot_at_root_branch() {
    let mut root = Node::new_inner(0, 0, true);
    let pf = PathFinder::new(&mut root, key(0x12, 0)).unwrap();
    assert!(pf.is_empty_slot());
    assert_eq!(pf.last_branch(), 1);
}

#[test]
fn inserting_then_refinding_the_same_key_matches() {
    let mut root = Node::new_inner(0, 0, true);
    let k = key(0x34, 0x56);
    {
        let mut pf = PathFinder::new(&mut root, k).unwrap();
        pf.dirty_or_copy_inners(0);
        pf.set_terminal(Node::new_leaf(LeafNode::new(
            Item::new(k, vec![1]),
            NodeType::AccountState,
        )));
    }
    let pf2 = PathFinder::new(&mut root, k).unwrap();
    assert!(pf2.leaf_matches());
}

#[test]
fn colliding_key_reports_divergence_past_the_shared_prefix() {
    let mut root = Node::new_inner(0, 0, true);
    let k1 = key(0x34, 0x56);
    let k2 = key(0x34, 0x99);
    {
        let mut pf = PathFinder::new(&mut root, k1).unwrap();
        pf.dirty_or_copy_inners(0);
        pf.set_terminal(Node::new_leaf(LeafNode::new(
            Item::new(k1, vec![1]),
            NodeType::AccountState,
        )));
    }
    let pf2 = PathFinder::new(&mut root, k2).unwrap();
    assert!(!pf2.is_empty_slot());
    assert!(!pf2.leaf_matches());
    // Keys agree on nibbles 0 and 1 (both byte0 = 0x34), diverge at nibble 2.
    assert_eq!(pf2.divergence_depth().unwrap(), 2);
}
