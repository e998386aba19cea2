use super::*;

#[test]
fn zero_hash_is_all_zero_bytes() {
    assert!(Hash256::zero().is_zero());
    assert_eq!(Hash256::zero().as_bytes(), &[0u8; 32]);
}

#[test]
fn hex_round_trips_through_from_slice() {
    let bytes = [7u8; 32];
    let h = Hash256::from_bytes(bytes);
    let decoded = hex::decode(h.hex()).expect("valid hex");
    assert_eq!(Hash256::from_slice(&decoded).unwrap(), h);
}

#[test]
fn streaming_and_one_shot_agree() {
    let mut streamed = Sha512Hash256::new();
    streamed.update(INNER_PREFIX).update(b"hello").update(b"world");
    let streamed_hash = streamed.finish();

    let one_shot = hash_with_prefix(&INNER_PREFIX, &[b"hello", b"world"]);
    assert_eq!(streamed_hash, one_shot);
}

#[test]
fn different_prefixes_give_different_hashes() {
    let a = hash_with_prefix(&LEAF_NODE_PREFIX, &[b"same"]);
    let b = hash_with_prefix(&TX_NODE_PREFIX, &[b"same"]);
    assert_ne!(a, b);
}

#[test]
fn ordering_is_lexicographic_on_bytes() {
    let a = Hash256::from_bytes([0u8; 32]);
    let mut high = [0u8; 32];
    high[0] = 1;
    let b = Hash256::from_bytes(high);
    assert!(a < b);
}
