use super::*;
use catl_shamap::SHAMap;
use catl_types::{Item, NodeType};
use catl_v2::writer::{Writer, WriterOptions};
use catl_v2::CatalogueReader;
use tempfile::NamedTempFile;

fn key(byte: u8, tail: u8) -> Key256 {
    let mut bytes = [tail; 32];
    bytes[0] = byte;
    Key256::from_bytes(bytes)
}

fn sample_header(seq: u32) -> catl_ledger::LedgerHeader {
    catl_ledger::LedgerHeader {
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

fn write_fixture(shamap: &SHAMap) -> NamedTempFile {
    let tmp = NamedTempFile::new().unwrap();
    let file = std::fs::File::create(tmp.path()).unwrap();
    let mut writer = Writer::new(file, WriterOptions::default()).unwrap();
    let tx = SHAMap::new(NodeType::TxNoMeta);
    writer
        .write_ledger(&sample_header(1), &shamap.root_node(), &tx.root_node())
        .unwrap();
    writer.finalize().unwrap();
    tmp
}

#[test]
fn representative_key_mmap_finds_the_leftmost_leaf_under_a_collapsed_fork() {
    let mut shamap = SHAMap::new(NodeType::AccountState);
    let k = key(0x11, 0);
    shamap.add_item(Item::new(k, b"a".to_vec())).unwrap();
    shamap.add_item(Item::new(key(0x12, 0), b"b".to_vec())).unwrap();
    let tmp = write_fixture(&shamap);

    let mut reader = CatalogueReader::open(tmp.path()).unwrap();
    reader.seek_to_ledger(1);
    let (state_abs, _) = reader.tree_roots_for_seq(1).unwrap();
    let root_header = reader.decode_inner_at(state_abs).unwrap();

    let found = representative_key_mmap(&crate::node_ref::MmapNode {
        reader: std::sync::Arc::new(reader),
        offset: state_abs,
    })
    .unwrap();
    // Branch 0x1 is the only non-empty top-level branch, and within it the
    // lower-keyed leaf (0x11...) occupies the lower nibble-1 branch.
    assert_eq!(found, Some(k));
    let _ = root_header;
}

#[test]
fn child_contribution_of_a_top_level_mmap_leaf_is_its_bare_hash() {
    let mut shamap = SHAMap::new(NodeType::AccountState);
    let k = key(0x05, 0);
    shamap.add_item(Item::new(k, b"solo".to_vec())).unwrap();
    let tmp = write_fixture(&shamap);

    let mut reader = CatalogueReader::open(tmp.path()).unwrap();
    reader.seek_to_ledger(1);
    let (state_abs, _) = reader.tree_roots_for_seq(1).unwrap();
    let root_header = reader.decode_inner_at(state_abs).unwrap();
    let reader = std::sync::Arc::new(reader);
    let branch = root_header.depth;
    let child_abs = reader.child_offset(state_abs, &root_header, k.nibble(branch as u16).unwrap()).unwrap();
    let (leaf, _) = reader.decode_leaf_at(child_abs).unwrap();

    let node = crate::node_ref::NodeRef::MmapLeaf(crate::node_ref::MmapNode {
        reader,
        offset: child_abs,
    });
    assert_eq!(child_contribution(root_header.depth, &node).unwrap(), leaf.hash);
}
