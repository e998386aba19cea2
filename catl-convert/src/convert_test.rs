use super::*;
use std::io::Write;

fn zero_hash() -> String {
    "00".repeat(32)
}

fn fixture_line(seq: u32, key_byte: u8, account_hash: &str) -> String {
    let key = format!("{:02x}", key_byte).repeat(32);
    format!(
        r#"{{"header":{{"sequence":{seq},"drops":0,"parent_hash":"{z}","tx_hash":"{z}","account_hash":"{account_hash}","parent_close_time":0,"close_time":0,"close_time_resolution":10,"close_flags":0,"hash":"{z}"}},"state_delta":[{{"node_type":"account_state","key":"{key}","data":"010203"}}],"tx_set":[]}}"#,
        z = zero_hash()
    )
}

#[test]
fn converts_two_ledgers_into_a_readable_v2_file() {
    let input = tempfile::NamedTempFile::new().unwrap();
    {
        let mut f = std::fs::File::create(input.path()).unwrap();
        writeln!(f, "{}", fixture_line(100, 1, &zero_hash())).unwrap();
        writeln!(f, "{}", fixture_line(101, 2, &zero_hash())).unwrap();
    }
    let output = tempfile::NamedTempFile::new().unwrap();

    run(&ConvertArgs {
        input: input.path().to_path_buf(),
        output: output.path().to_path_buf(),
        max_ledgers: 0,
        verify_and_test: false,
    })
    .unwrap();

    let mut reader = catl_v2::CatalogueReader::open(output.path()).unwrap();
    assert!(reader.seek_to_ledger(100));
    assert_eq!(reader.read_ledger_info().unwrap().sequence, 100);

    let key100 = catl_types::Key256::from_bytes([0x01; 32]);
    let key101 = catl_types::Key256::from_bytes([0x02; 32]);
    assert_eq!(
        reader.lookup_key_in_state(&key100).unwrap().map(|d| d.to_vec()),
        Some(vec![0x01, 0x02, 0x03])
    );
    // Ledger 100's tree doesn't carry ledger 101's key yet.
    assert!(reader.lookup_key_in_state(&key101).unwrap().is_none());

    assert!(reader.seek_to_ledger(101));
    // Ledger 101's state is cumulative: it still has key 100's record too.
    assert_eq!(
        reader.lookup_key_in_state(&key100).unwrap().map(|d| d.to_vec()),
        Some(vec![0x01, 0x02, 0x03])
    );
    assert_eq!(
        reader.lookup_key_in_state(&key101).unwrap().map(|d| d.to_vec()),
        Some(vec![0x01, 0x02, 0x03])
    );
}

#[test]
fn max_ledgers_stops_early() {
    let input = tempfile::NamedTempFile::new().unwrap();
    {
        let mut f = std::fs::File::create(input.path()).unwrap();
        writeln!(f, "{}", fixture_line(1, 1, &zero_hash())).unwrap();
        writeln!(f, "{}", fixture_line(2, 2, &zero_hash())).unwrap();
        writeln!(f, "{}", fixture_line(3, 3, &zero_hash())).unwrap();
    }
    let output = tempfile::NamedTempFile::new().unwrap();

    run(&ConvertArgs {
        input: input.path().to_path_buf(),
        output: output.path().to_path_buf(),
        max_ledgers: 1,
        verify_and_test: false,
    })
    .unwrap();

    let reader = catl_v2::CatalogueReader::open(output.path()).unwrap();
    assert_eq!(reader.header().ledger_count, 1);
}

#[test]
fn verify_and_test_rejects_a_mismatched_account_hash() {
    let input = tempfile::NamedTempFile::new().unwrap();
    {
        let mut f = std::fs::File::create(input.path()).unwrap();
        // account_hash is all-zero, which won't match the real root hash of
        // a tree holding one non-empty item.
        writeln!(f, "{}", fixture_line(1, 1, &zero_hash())).unwrap();
    }
    let output = tempfile::NamedTempFile::new().unwrap();

    let err = run(&ConvertArgs {
        input: input.path().to_path_buf(),
        output: output.path().to_path_buf(),
        max_ledgers: 0,
        verify_and_test: true,
    })
    .unwrap_err();

    assert!(format!("{err:#}").contains("disagrees with v1 account_hash"));
}
