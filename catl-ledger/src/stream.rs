//! The trait boundary for the out-of-scope v1 CATL reader (§4.13/§6.2).
//! This crate only defines the shape a v1 source must hand over; the
//! reader itself — `xdata` binary field parsing, base58, the actual file
//! format — lives outside this workspace. `catl-convert` supplies a
//! fixture-backed implementation for its own tests.

use crate::header::LedgerHeaderV1;
use catl_types::{Key256, NodeType, Result};

/// One `(node_type, key, data)` record from a v1 state delta or tx set.
/// `node_type == NodeType::Remove` means "delete this key from the state
/// tree"; `NodeType::Terminal` never appears here — the vectors in
/// [`V1Ledger`] are already terminated by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct V1Record {
    pub node_type: NodeType,
    pub key: Key256,
    pub data: Vec<u8>,
}

/// One v1 ledger: its header plus the state-tree delta and a full
/// transaction set to build a fresh tx tree from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct V1Ledger {
    pub header: LedgerHeaderV1,
    pub state_delta: Vec<V1Record>,
    pub tx_set: Vec<V1Record>,
}

/// Yields a sequence of [`V1Ledger`]s. The only collaborator `catl-convert`
/// needs from the (out-of-scope) v1 reader.
pub trait V1LedgerStream {
    /// Returns the next ledger, or `Ok(None)` once the stream is exhausted.
    fn next_ledger(&mut self) -> Result<Option<V1Ledger>>;
}

#[cfg(test)]
mod stream_test;
