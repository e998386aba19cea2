// Copyright (c) Catalogue Tools Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! The canonical rippled-shape ledger header ([`header::LedgerHeader`]) and
//! the out-of-scope v1 CATL reader's trait boundary ([`stream`]).
//!
//! Everything upstream of the v2 catalogue format (the v1 reader itself,
//! `xdata`, base58) lives outside this workspace; this crate only defines
//! the narrow seam `catl-convert` needs to consume a v1 stream and re-pack
//! its ledger headers into the canonical layout `catl-v2` writes to disk.

pub mod header;
pub mod stream;

pub use header::{LedgerHeader, LedgerHeaderV1};
pub use stream::{V1Ledger, V1LedgerStream, V1Record};
