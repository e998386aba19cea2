//! A JSON-lines stand-in for the out-of-scope real v1 CATL reader (§1,
//! §6.2): this crate's only job is to hand `convert::run` something that
//! implements [`V1LedgerStream`], and the real `xdata`/base58 v1 parser is
//! explicitly named as an external collaborator this workspace doesn't
//! build. One JSON object per line, each decoding to a [`FixtureLedger`];
//! good enough to drive `--input`/`--output` end to end in tests and for a
//! reader who wants to see the converter run without a real rippled/xahaud
//! v1 file on hand.

use anyhow::{Context, Result};
use catl_ledger::stream::{V1Ledger, V1LedgerStream, V1Record};
use catl_ledger::LedgerHeaderV1;
use catl_types::{Hash256, Key256, NodeType};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Deserialize)]
struct FixtureHeader {
    sequence: u32,
    drops: u64,
    parent_hash: String,
    tx_hash: String,
    account_hash: String,
    parent_close_time: u32,
    close_time: u32,
    close_time_resolution: u8,
    close_flags: u32,
    hash: String,
}

#[derive(Deserialize)]
struct FixtureRecord {
    node_type: String,
    key: String,
    #[serde(default)]
    data: String,
}

#[derive(Deserialize)]
struct FixtureLedger {
    header: FixtureHeader,
    #[serde(default)]
    state_delta: Vec<FixtureRecord>,
    #[serde(default)]
    tx_set: Vec<FixtureRecord>,
}

fn parse_hash(s: &str) -> Result<Hash256> {
    let bytes = hex::decode(s).with_context(|| format!("invalid hex hash: {s}"))?;
    Hash256::from_slice(&bytes).with_context(|| format!("hash {s} is not 32 bytes"))
}

fn parse_key(s: &str) -> Result<Key256> {
    let bytes = hex::decode(s).with_context(|| format!("invalid hex key: {s}"))?;
    Key256::from_slice(&bytes).with_context(|| format!("key {s} is not 32 bytes"))
}

fn parse_node_type(s: &str) -> Result<NodeType> {
    Ok(match s {
        "account_state" => NodeType::AccountState,
        "tx_no_meta" => NodeType::TxNoMeta,
        "tx_with_meta" => NodeType::TxWithMeta,
        "remove" => NodeType::Remove,
        other => anyhow::bail!("unknown node_type {other:?}"),
    })
}

fn to_record(r: FixtureRecord) -> Result<V1Record> {
    Ok(V1Record {
        node_type: parse_node_type(&r.node_type)?,
        key: parse_key(&r.key)?,
        data: hex::decode(&r.data).with_context(|| format!("invalid hex data: {}", r.data))?,
    })
}

fn to_ledger(f: FixtureLedger) -> Result<V1Ledger> {
    let header = LedgerHeaderV1 {
        sequence: f.header.sequence,
        drops: f.header.drops,
        parent_hash: parse_hash(&f.header.parent_hash)?,
        tx_hash: parse_hash(&f.header.tx_hash)?,
        account_hash: parse_hash(&f.header.account_hash)?,
        parent_close_time: f.header.parent_close_time,
        close_time: f.header.close_time,
        close_time_resolution: f.header.close_time_resolution,
        close_flags: f.header.close_flags,
        hash: parse_hash(&f.header.hash)?,
    };
    let state_delta = f
        .state_delta
        .into_iter()
        .map(to_record)
        .collect::<Result<Vec<_>>>()?;
    let tx_set = f
        .tx_set
        .into_iter()
        .map(to_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(V1Ledger {
        header,
        state_delta,
        tx_set,
    })
}

/// Reads an entire JSON-lines fixture file into memory up front; the real
/// v1 collaborator would stream, but a converter test fixture never needs
/// to.
pub struct JsonLinesStream {
    remaining: std::collections::VecDeque<V1Ledger>,
}

impl JsonLinesStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("opening v1 fixture {}", path.as_ref().display()))?;
        let reader = BufReader::new(file);
        let mut remaining = std::collections::VecDeque::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fixture: FixtureLedger = serde_json::from_str(&line)
                .with_context(|| format!("parsing fixture line {}", lineno + 1))?;
            remaining.push_back(to_ledger(fixture)?);
        }
        Ok(Self { remaining })
    }
}

impl V1LedgerStream for JsonLinesStream {
    fn next_ledger(&mut self) -> catl_types::Result<Option<V1Ledger>> {
        Ok(self.remaining.pop_front())
    }
}

#[cfg(test)]
mod fixture_test;
