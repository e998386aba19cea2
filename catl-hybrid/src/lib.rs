// Copyright (c) Catalogue Tools Contributors
// SPDX-License-Identifier: Apache-2.0

//! The hybrid mmap/heap map (§4.10) and the mmap-native `MemTree` diff
//! (§4.11): a `HybridMap` reads straight through an mmap'd v2 catalogue's
//! tree until a write forces a branch to materialize onto the heap, and
//! `diff` compares two such trees (mmap-resident on both sides, or freely
//! mixed) without ever materializing either one, using the depth-projection
//! alignment `catl_shamap::diff` does not implement for its purely in-memory
//! trees (see `DESIGN.md`).
//!
//! Like `catl-v2`, this crate does not `forbid(unsafe_code)` at the crate
//! level — in practice it adds none of its own, since every mmap access
//! here goes through `catl_v2::CatalogueReader`'s already bounds-checked,
//! already `unsafe`-isolated accessors.

mod diff;
mod hashing;
mod heap;
mod map;
mod node_ref;

pub use diff::{diff, diff_ledger_state, diff_ledger_tx, MemDiffEntry};
pub use heap::{HeapInner, HeapLeaf, HeapPlaceholder};
pub use map::HybridMap;
pub use node_ref::{MmapNode, NodeRef};
