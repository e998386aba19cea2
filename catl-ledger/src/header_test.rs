use super::*;

fn sample() -> LedgerHeader {
    LedgerHeader {
        sequence: 81_920,
        drops: 99_999_999_000_000,
        parent_hash: Hash256::from_bytes([1u8; 32]),
        tx_hash: Hash256::from_bytes([2u8; 32]),
        account_hash: Hash256::from_bytes([3u8; 32]),
        parent_close_time: 700_000_000,
        close_time: 700_000_010,
        close_time_resolution: 10,
        close_flags: 0,
        hash: Hash256::from_bytes([4u8; 32]),
    }
}

#[test]
fn canonical_encoding_is_118_bytes() {
    assert_eq!(sample().encode_canonical().len(), CANONICAL_LEN);
    assert_eq!(CANONICAL_LEN, 118);
}

#[test]
fn wire_encoding_round_trips() {
    let header = sample();
    let bytes = header.encode();
    assert_eq!(bytes.len(), WIRE_LEN);
    let decoded = LedgerHeader::decode(&bytes).unwrap();
    assert_eq!(decoded, header);
}

#[test]
fn decode_rejects_short_buffers() {
    assert!(LedgerHeader::decode(&[0u8; WIRE_LEN - 1]).is_err());
}

#[test]
fn to_canonical_narrows_close_flags() {
    let v1 = LedgerHeaderV1 {
        sequence: 1,
        drops: 1,
        parent_hash: Hash256::zero(),
        tx_hash: Hash256::zero(),
        account_hash: Hash256::zero(),
        parent_close_time: 0,
        close_time: 0,
        close_time_resolution: 0,
        close_flags: 0x1234_5601,
        hash: Hash256::zero(),
    };
    let v2 = to_canonical(&v1);
    assert_eq!(v2.close_flags, 0x01);
}

#[test]
fn from_canonical_widens_with_zeroed_high_bits() {
    let v2 = sample();
    let v1 = from_canonical(&v2);
    assert_eq!(v1.close_flags, v2.close_flags as u32);
    assert_eq!(v1.close_flags & !0xFF, 0);
}

#[test]
fn canonical_round_trip_preserves_low_byte_of_close_flags() {
    let mut v1 = LedgerHeaderV1 {
        sequence: 5,
        drops: 5,
        parent_hash: Hash256::zero(),
        tx_hash: Hash256::zero(),
        account_hash: Hash256::zero(),
        parent_close_time: 1,
        close_time: 2,
        close_time_resolution: 3,
        close_flags: 0xAB,
        hash: Hash256::zero(),
    };
    let v2 = to_canonical(&v1);
    let back = from_canonical(&v2);
    v1.close_flags = 0xAB; // low byte only, matching the intentional narrowing
    assert_eq!(back.close_flags, v1.close_flags);
}
