use super::*;
use catl_shamap::SHAMap;
use catl_types::{Hash256, Item, Key256, NodeType};
use std::io::Cursor;

fn sample_header(seq: u32) -> LedgerHeader {
    LedgerHeader {
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
    }
}

fn item(byte: u8, data: &[u8]) -> Item {
    Item::new(Key256::from_bytes([byte; 32]), data.to_vec())
}

#[test]
fn writes_valid_file_header_and_one_ledger() {
    let mut state = SHAMap::new(NodeType::AccountState);
    state.add_item(item(1, b"hello")).unwrap();
    let tx = SHAMap::new(NodeType::TxNoMeta);

    let mut writer = Writer::new(Cursor::new(Vec::new()), WriterOptions::default()).unwrap();
    writer
        .write_ledger(&sample_header(100), &state.root_node(), &tx.root_node())
        .unwrap();
    let stats = writer.finalize().unwrap();

    assert_eq!(stats.ledgers_written, 1);
    assert!(stats.leaf_nodes_written >= 1);
}

#[test]
fn dedups_unmodified_subtrees_across_ledgers() {
    let mut state = SHAMap::new(NodeType::AccountState);
    state.add_item(item(1, b"hello")).unwrap();
    let tx = SHAMap::new(NodeType::TxNoMeta);

    let mut writer = Writer::new(Cursor::new(Vec::new()), WriterOptions::default()).unwrap();
    writer
        .write_ledger(&sample_header(100), &state.root_node(), &tx.root_node())
        .unwrap();
    // Second ledger reuses the identical (unmodified) state root.
    writer
        .write_ledger(&sample_header(101), &state.root_node(), &tx.root_node())
        .unwrap();
    let stats = writer.finalize().unwrap();

    assert_eq!(stats.ledgers_written, 2);
    assert!(stats.nodes_deduped > 0, "second ledger should reuse cached nodes");
}

#[test]
fn compression_is_opt_in_and_shrinks_repetitive_payloads() {
    let mut state = SHAMap::new(NodeType::AccountState);
    let big = vec![b'x'; 4096];
    state.add_item(item(9, &big)).unwrap();
    let tx = SHAMap::new(NodeType::TxNoMeta);

    let options = WriterOptions {
        compress: true,
        compress_threshold: 64,
        ..WriterOptions::default()
    };
    let mut writer = Writer::new(Cursor::new(Vec::new()), options).unwrap();
    writer
        .write_ledger(&sample_header(1), &state.root_node(), &tx.root_node())
        .unwrap();
    let stats = writer.finalize().unwrap();

    assert!(stats.compression_ratio() < 1.0);
}
