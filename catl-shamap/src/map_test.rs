use super::*;
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
fn empty_map_hashes_deterministically() {
    let a = SHAMap::new(NodeType::AccountState);
    let b = SHAMap::new(NodeType::AccountState);
    assert_eq!(a.root_hash(), b.root_hash());
}

#[test]
fn set_then_get_round_trips() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k = key_from(0x11, 0x22);
    upsert(&mut map, k, vec![9, 9]);
    let got = map.get_item(k).unwrap().unwrap();
    assert_eq!(got.data.as_bytes(), &[9, 9]);
}

#[test]
fn add_item_rejects_existing_key() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k = key_from(0x11, 0x22);
    assert_eq!(map.add_item(Item::new(k, vec![1])).unwrap(), SetResult::Added);
    assert_eq!(map.add_item(Item::new(k, vec![2])).unwrap(), SetResult::Failed);
}

#[test]
fn update_item_rejects_missing_key() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k = key_from(0x11, 0x22);
    assert_eq!(map.update_item(Item::new(k, vec![1])).unwrap(), SetResult::Failed);
}

#[test]
fn update_item_on_matching_key_reports_updated() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k = key_from(0x11, 0x22);
    map.add_item(Item::new(k, vec![1])).unwrap();
    assert_eq!(map.update_item(Item::new(k, vec![2])).unwrap(), SetResult::Updated);
    assert_eq!(map.get_item(k).unwrap().unwrap().data.as_bytes(), &[2]);
}

#[test]
fn remove_item_deletes_and_updates_hash() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k = key_from(0x11, 0x22);
    upsert(&mut map, k, vec![1]);
    let with_item = map.root_hash();
    assert!(map.remove_item(k).unwrap());
    assert!(map.get_item(k).unwrap().is_none());
    assert_ne!(map.root_hash(), with_item);
}

#[test]
fn remove_item_on_missing_key_returns_false() {
    let mut map = SHAMap::new(NodeType::AccountState);
    assert!(!map.remove_item(key_from(0x11, 0x22)).unwrap());
}

#[test]
fn colliding_keys_both_remain_retrievable() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k1 = key_from(0x34, 0x56);
    let k2 = key_from(0x34, 0x99);
    upsert(&mut map, k1, vec![1]);
    upsert(&mut map, k2, vec![2]);
    assert_eq!(map.get_item(k1).unwrap().unwrap().data.as_bytes(), &[1]);
    assert_eq!(map.get_item(k2).unwrap().unwrap().data.as_bytes(), &[2]);
}

#[test]
fn insert_then_remove_restores_prior_hash() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k1 = key_from(0x34, 0x56);
    let k2 = key_from(0x34, 0x99);
    upsert(&mut map, k1, vec![1]);
    let before = map.root_hash();
    map.add_item(Item::new(k2, vec![2])).unwrap();
    assert!(map.remove_item(k2).unwrap());
    assert_eq!(map.root_hash(), before);
}

#[test]
fn snapshot_preserves_hash_and_isolates_future_writes() {
    let mut map = SHAMap::new(NodeType::AccountState);
    let k = key_from(0x01, 0x02);
    upsert(&mut map, k, vec![1]);
    let before_hash = map.root_hash();

    let mut snap = map.snapshot();
    assert_eq!(snap.root_hash(), before_hash);

    upsert(&mut map, k, vec![2]);
    assert_ne!(map.root_hash(), before_hash);
    assert_eq!(snap.root_hash(), before_hash);

    let k2 = key_from(0x03, 0x04);
    upsert(&mut snap, k2, vec![3]);
    assert!(map.get_item(k2).unwrap().is_none());
}

#[test]
fn collapse_tree_does_not_change_root_hash() {
    let mut map = SHAMap::with_options(
        NodeType::AccountState,
        SHAMapOptions::new(CollapseMode::LeafsAndInners),
    );
    for b in 0..8u8 {
        upsert(&mut map, key_from(0x10, b), vec![b]);
    }
    let before = map.root_hash();
    map.collapse_tree();
    assert_eq!(map.root_hash(), before);
}
