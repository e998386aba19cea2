// Copyright (c) Catalogue Tools Contributors
// SPDX-License-Identifier: Apache-2.0

//! The v2 catalogue file format (§3.5, §4.8, §4.9): wire layouts
//! ([`wire`]), the depth-first deduplicating [`writer::Writer`], and the
//! mmap-backed [`reader::CatalogueReader`]. Unlike the rest of this
//! workspace, this crate does not `forbid(unsafe_code)` — `reader` needs it
//! for the two `Mmap::map` calls that back a [`reader::CatalogueReader`];
//! every other module here stays safe Rust over the resulting byte slices.

pub mod reader;
pub mod wire;
pub mod writer;

pub use reader::{CatalogueReader, WalkOptions};
pub use wire::{ChildType, FileHeader, InnerNodeHeader, LeafHeader, LedgerIndexEntry};
pub use writer::{Writer, WriterOptions, WriterStats};
