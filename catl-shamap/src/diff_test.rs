use super::*;
use crate::map::{SHAMap, SetMode};
use catl_types::NodeType;

fn key_from(byte0: u8, byte1: u8) -> Key256 {
    let mut bytes = [0u8; 32];
    bytes[0] = byte0;
    bytes[1] = byte1;
    Key256::from_bytes(bytes)
}

fn upsert(map: &mut SHAMap, key: Key256, data: Vec<u8>) {
    map.set_item(Item::new(key, data), SetMode::AddOrUpdate).unwrap();
}

#[test]
fn identical_trees_diff_to_empty() {
    let mut a = SHAMap::new(NodeType::AccountState);
    upsert(&mut a, key_from(1, 2), vec![1]);
    let mut b = a.snapshot();
    assert!(diff(&a, &b).is_empty());
    // also true the other direction, even after an unrelated no-op write
    let _ = b.get_item(key_from(1, 2));
    assert!(diff(&b, &a).is_empty());
}

#[test]
fn added_item_shows_up_as_added() {
    let mut before = SHAMap::new(NodeType::AccountState);
    upsert(&mut before, key_from(1, 1), vec![1]);
    let mut after = before.snapshot();
    let k2 = key_from(2, 2);
    upsert(&mut after, k2, vec![2]);

    let d = diff(&before, &after);
    assert_eq!(d.len(), 1);
    match d.get(&k2).unwrap() {
        DiffEntry::Added(item) => assert_eq!(item.data.as_bytes(), &[2]),
        other => panic!("expected Added, got {other:?}"),
    }
}

#[test]
fn removed_item_shows_up_as_removed() {
    let mut before = SHAMap::new(NodeType::AccountState);
    let k = key_from(3, 3);
    upsert(&mut before, k, vec![9]);
    let mut after = before.snapshot();
    after.remove_item(k).unwrap();

    let d = diff(&before, &after);
    assert_eq!(d.len(), 1);
    assert!(matches!(d.get(&k).unwrap(), DiffEntry::Removed(_)));
}

#[test]
fn changed_value_shows_up_as_modified() {
    let mut before = SHAMap::new(NodeType::AccountState);
    let k = key_from(4, 4);
    upsert(&mut before, k, vec![1]);
    let mut after = before.snapshot();
    upsert(&mut after, k, vec![2]);

    let d = diff(&before, &after);
    assert_eq!(d.len(), 1);
    match d.get(&k).unwrap() {
        DiffEntry::Modified { before, after } => {
            assert_eq!(before.data.as_bytes(), &[1]);
            assert_eq!(after.data.as_bytes(), &[2]);
        }
        other => panic!("expected Modified, got {other:?}"),
    }
}

#[test]
fn invert_swaps_added_and_removed() {
    let mut before = SHAMap::new(NodeType::AccountState);
    let mut after = before.snapshot();
    let k = key_from(5, 5);
    upsert(&mut after, k, vec![1]);

    let forward = diff(&before, &after);
    let backward = forward.invert();
    assert!(matches!(backward.get(&k).unwrap(), DiffEntry::Removed(_)));
    assert_eq!(forward, diff(&before, &after));
}

#[test]
fn unchanged_key_surviving_a_leaf_to_inner_split_is_not_reported() {
    // `before` has a single leaf at this branch; `after` adds a sibling that
    // collides with it, turning that branch into an inner with both the
    // original (unchanged) leaf and the new one. The original key's data
    // never changed, so it must not show up as Removed+Added.
    let mut before = SHAMap::new(NodeType::AccountState);
    let original = key_from(8, 0);
    upsert(&mut before, original, vec![1]);
    let mut after = before.snapshot();
    let sibling = key_from(8, 1);
    upsert(&mut after, sibling, vec![2]);

    let d = diff(&before, &after);
    assert_eq!(d.len(), 1);
    assert!(d.get(&original).is_none());
    match d.get(&sibling).unwrap() {
        DiffEntry::Added(item) => assert_eq!(item.data.as_bytes(), &[2]),
        other => panic!("expected Added, got {other:?}"),
    }
}

#[test]
fn apply_brings_before_up_to_after() {
    let mut before = SHAMap::new(NodeType::AccountState);
    upsert(&mut before, key_from(6, 6), vec![1]);
    let mut after = before.snapshot();
    upsert(&mut after, key_from(7, 7), vec![2]);
    after.remove_item(key_from(6, 6)).unwrap();

    let d = diff(&before, &after);
    let mut target = before.snapshot();
    d.apply(&mut target).unwrap();
    assert_eq!(target.root_hash(), after.root_hash());
}
