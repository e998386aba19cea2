use super::*;
use catl_types::Hash256;

struct FixtureStream {
    remaining: Vec<V1Ledger>,
}

impl V1LedgerStream for FixtureStream {
    fn next_ledger(&mut self) -> Result<Option<V1Ledger>> {
        Ok(if self.remaining.is_empty() {
            None
        } else {
            Some(self.remaining.remove(0))
        })
    }
}

fn fixture_ledger(seq: u32) -> V1Ledger {
    V1Ledger {
        header: LedgerHeaderV1 {
            sequence: seq,
            drops: 0,
            parent_hash: Hash256::zero(),
            tx_hash: Hash256::zero(),
            account_hash: Hash256::zero(),
            parent_close_time: 0,
            close_time: 0,
            close_time_resolution: 10,
            close_flags: 0,
            hash: Hash256::zero(),
        },
        state_delta: vec![V1Record {
            node_type: NodeType::AccountState,
            key: Key256::from_bytes([seq as u8; 32]),
            data: vec![1, 2, 3],
        }],
        tx_set: vec![],
    }
}

#[test]
fn stream_yields_ledgers_in_order_then_ends() {
    let mut stream = FixtureStream {
        remaining: vec![fixture_ledger(1), fixture_ledger(2)],
    };
    assert_eq!(stream.next_ledger().unwrap().unwrap().header.sequence, 1);
    assert_eq!(stream.next_ledger().unwrap().unwrap().header.sequence, 2);
    assert!(stream.next_ledger().unwrap().is_none());
}

#[test]
fn remove_record_carries_no_payload_invariant_by_convention() {
    let record = V1Record {
        node_type: NodeType::Remove,
        key: Key256::from_bytes([9u8; 32]),
        data: vec![],
    };
    assert_eq!(record.node_type, NodeType::Remove);
    assert!(record.data.is_empty());
}
