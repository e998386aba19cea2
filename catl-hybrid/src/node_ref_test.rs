use super::*;

#[test]
fn empty_hashes_to_zero() {
    assert_eq!(NodeRef::Empty.get_hash().unwrap(), Hash256::zero());
}

#[test]
fn is_empty_and_is_mmap_agree_for_empty() {
    let n = NodeRef::Empty;
    assert!(n.is_empty());
    assert!(!n.is_mmap());
}

#[test]
fn heap_placeholder_trusts_its_stored_hash() {
    let h = Hash256::from_bytes([7u8; 32]);
    let n = NodeRef::HeapPlaceholder(Arc::new(HeapPlaceholder { hash: h }));
    assert_eq!(n.get_hash().unwrap(), h);
    assert!(!n.is_empty());
    assert!(!n.is_mmap());
}
