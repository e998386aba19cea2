use super::*;
use std::io::Write;

fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

fn zero_hash() -> String {
    "00".repeat(32)
}

fn line(seq: u32, state_key: Option<&str>) -> String {
    let state_delta = match state_key {
        Some(k) => format!(
            r#"[{{"node_type":"account_state","key":"{k}","data":"010203"}}]"#
        ),
        None => "[]".to_string(),
    };
    format!(
        r#"{{"header":{{"sequence":{seq},"drops":0,"parent_hash":"{h}","tx_hash":"{h}","account_hash":"{h}","parent_close_time":0,"close_time":0,"close_time_resolution":10,"close_flags":0,"hash":"{h}"}},"state_delta":{state_delta},"tx_set":[]}}"#,
        h = zero_hash()
    )
}

#[test]
fn parses_one_ledger_with_a_state_record() {
    let key = "11".repeat(32);
    let contents = line(100, Some(&key));
    let f = write_fixture(&contents);

    let mut stream = JsonLinesStream::open(f.path()).unwrap();
    let ledger = stream.next_ledger().unwrap().unwrap();
    assert_eq!(ledger.header.sequence, 100);
    assert_eq!(ledger.state_delta.len(), 1);
    assert_eq!(ledger.state_delta[0].data, vec![0x01, 0x02, 0x03]);
    assert!(stream.next_ledger().unwrap().is_none());
}

#[test]
fn parses_multiple_lines_in_order() {
    let contents = format!("{}\n{}\n", line(1, None), line(2, None));
    let f = write_fixture(&contents);

    let mut stream = JsonLinesStream::open(f.path()).unwrap();
    assert_eq!(stream.next_ledger().unwrap().unwrap().header.sequence, 1);
    assert_eq!(stream.next_ledger().unwrap().unwrap().header.sequence, 2);
    assert!(stream.next_ledger().unwrap().is_none());
}

#[test]
fn rejects_bad_hex_key() {
    let contents = r#"{"header":{"sequence":1,"drops":0,"parent_hash":"00","tx_hash":"00","account_hash":"00","parent_close_time":0,"close_time":0,"close_time_resolution":10,"close_flags":0,"hash":"00"},"state_delta":[],"tx_set":[]}"#;
    let f = write_fixture(contents);
    let err = JsonLinesStream::open(f.path()).unwrap_err();
    assert!(format!("{err:#}").contains("32 bytes"));
}
