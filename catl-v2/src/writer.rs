//! Depth-first, deduplicating v2 file writer (§4.8). Every distinct node
//! (by heap pointer identity, matching `catl-shamap`'s `Arc`-backed
//! structural sharing) is written at most once across the whole run of
//! ledgers; a repeated node — typically an unmodified subtree a CoW
//! snapshot still shares with its parent — is referenced by its previously
//! written absolute offset instead of being re-serialized.

use crate::wire::{
    self, ChildType, FileHeader, InnerNodeHeader, LeafHeader, LedgerIndexEntry, FLAG_HAS_INDEX,
    INNER_NODE_HEADER_LEN,
};
use byteorder::{LittleEndian, WriteBytesExt};
use catl_ledger::LedgerHeader;
use catl_shamap::node::Node;
use catl_shamap::CollapseMode;
use catl_types::{Error, Result};
use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

/// Per-call knobs for the v2 writer.
#[derive(Clone, Copy, Debug)]
pub struct WriterOptions {
    pub network_id: u16,
    /// Whether leaf payloads at or above `compress_threshold` bytes are
    /// lz4-compressed before being written (§9 Open Question: compression
    /// granularity is per-leaf in this implementation).
    pub compress: bool,
    pub compress_threshold: usize,
    pub collapse: CollapseMode,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            network_id: 0,
            compress: false,
            compress_threshold: 256,
            collapse: CollapseMode::LeafsAndInners,
        }
    }
}

/// Observability counters returned from [`Writer::finalize`], matching the
/// `tracing::info!` summary line emitted per ledger (§4.8).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub ledgers_written: u64,
    pub inner_nodes_written: u64,
    pub leaf_nodes_written: u64,
    pub nodes_deduped: u64,
    pub inner_bytes_written: u64,
    pub leaf_bytes_written: u64,
    pub leaf_bytes_uncompressed: u64,
}

impl WriterStats {
    /// `leaf_bytes_written / leaf_bytes_uncompressed`, or `1.0` if nothing
    /// was compressed (including the case of no leaves at all).
    pub fn compression_ratio(&self) -> f64 {
        if self.leaf_bytes_uncompressed == 0 {
            1.0
        } else {
            self.leaf_bytes_written as f64 / self.leaf_bytes_uncompressed as f64
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKind {
    Inner,
    Leaf,
}

pub struct Writer<W: Write + Seek> {
    out: W,
    write_offset: u64,
    options: WriterOptions,
    node_cache: HashMap<(NodeKind, usize), u64>,
    ledger_offsets: Vec<(u32, u64)>,
    first_ledger: Option<u32>,
    last_ledger: Option<u32>,
    stats: WriterStats,
}

impl<W: Write + Seek> Writer<W> {
    /// Writes the (zeroed) `FileHeader` placeholder and positions the
    /// writer to append the first node right after it.
    pub fn new(mut out: W, options: WriterOptions) -> Result<Self> {
        let placeholder = FileHeader {
            network_id: options.network_id,
            flags: 0,
            first_ledger: 0,
            last_ledger: 0,
            ledger_count: 0,
            index_offset: 0,
        };
        out.write_all(&placeholder.encode())?;
        Ok(Self {
            out,
            write_offset: wire::FILE_HEADER_LEN as u64,
            options,
            node_cache: HashMap::new(),
            ledger_offsets: Vec::new(),
            first_ledger: None,
            last_ledger: None,
            stats: WriterStats::default(),
        })
    }

    /// Serializes `state_root`'s and `tx_root`'s trees (if not already
    /// cached from a prior ledger) and appends a `LedgerEntry` for them.
    pub fn write_ledger(
        &mut self,
        header: &LedgerHeader,
        state_root: &Node,
        tx_root: &Node,
    ) -> Result<()> {
        let state_abs = self.serialize_node(state_root)?;
        let tx_abs = self.serialize_node(tx_root)?;

        let ledger_abs = self.write_offset;
        let header_bytes = header.encode();
        self.out.write_all(&header_bytes)?;
        self.write_offset += header_bytes.len() as u64;

        let state_slot = self.write_offset;
        let state_rel = wire::make_rel_offset(state_slot, state_abs)?;
        self.out.write_i32::<LittleEndian>(state_rel)?;
        self.write_offset += 4;

        let tx_slot = self.write_offset;
        let tx_rel = wire::make_rel_offset(tx_slot, tx_abs)?;
        self.out.write_i32::<LittleEndian>(tx_rel)?;
        self.write_offset += 4;

        self.ledger_offsets.push((header.sequence, ledger_abs));
        self.first_ledger.get_or_insert(header.sequence);
        self.last_ledger = Some(header.sequence);
        self.stats.ledgers_written += 1;

        tracing::info!(
            seq = header.sequence,
            inner_nodes = self.stats.inner_nodes_written,
            leaf_nodes = self.stats.leaf_nodes_written,
            deduped = self.stats.nodes_deduped,
            "wrote ledger to v2 catalogue"
        );
        Ok(())
    }

    fn serialize_node(&mut self, node: &Node) -> Result<u64> {
        match node {
            Node::Leaf(leaf) => {
                let key = (NodeKind::Leaf, Arc::as_ptr(leaf) as *const () as usize);
                if let Some(&abs) = self.node_cache.get(&key) {
                    self.stats.nodes_deduped += 1;
                    return Ok(abs);
                }
                let abs = self.write_offset;
                let raw = leaf.item.data.as_bytes();
                let (payload, compressed) = self.maybe_compress(raw);
                let leaf_header = LeafHeader {
                    hash: leaf.hash(),
                    key: leaf.item.key,
                    data_size: payload.len() as u32,
                    compressed,
                };
                let header_bytes = leaf_header.encode()?;
                self.out.write_all(&header_bytes)?;
                self.out.write_all(&payload)?;
                self.write_offset += (header_bytes.len() + payload.len()) as u64;

                self.stats.leaf_nodes_written += 1;
                self.stats.leaf_bytes_written += payload.len() as u64;
                self.stats.leaf_bytes_uncompressed += raw.len() as u64;
                self.node_cache.insert(key, abs);
                Ok(abs)
            }
            Node::Inner(inner) => {
                let key = (NodeKind::Inner, Arc::as_ptr(inner) as *const () as usize);
                if let Some(&abs) = self.node_cache.get(&key) {
                    self.stats.nodes_deduped += 1;
                    return Ok(abs);
                }
                let entries = inner.entries();
                let mut child_offsets = Vec::with_capacity(entries.len());
                for (branch, child) in &entries {
                    let abs = self.serialize_node(child)?;
                    child_offsets.push((*branch, abs, child.is_leaf()));
                }

                let mut child_types = 0u32;
                let mut overlay_mask = 0u16;
                for (branch, _, is_leaf) in &child_offsets {
                    let ty = if *is_leaf {
                        ChildType::Leaf
                    } else {
                        ChildType::Inner
                    };
                    wire::set_child_type(&mut child_types, *branch, ty);
                    overlay_mask |= 1u16 << branch;
                }

                let abs = self.write_offset;
                let header = InnerNodeHeader {
                    hash: inner.hash(self.options.collapse),
                    depth: inner.depth(),
                    child_types,
                    overlay_mask,
                };
                self.out.write_all(&header.encode())?;
                self.write_offset += INNER_NODE_HEADER_LEN as u64;

                for (i, (_, child_abs, _)) in child_offsets.iter().enumerate() {
                    let slot_abs = abs + INNER_NODE_HEADER_LEN as u64 + (i as u64 * 4);
                    let rel = wire::make_rel_offset(slot_abs, *child_abs)?;
                    self.out.write_i32::<LittleEndian>(rel)?;
                    self.write_offset += 4;
                }

                self.stats.inner_nodes_written += 1;
                self.stats.inner_bytes_written +=
                    INNER_NODE_HEADER_LEN as u64 + (child_offsets.len() as u64 * 4);
                self.node_cache.insert(key, abs);
                Ok(abs)
            }
        }
    }

    fn maybe_compress(&self, raw: &[u8]) -> (Vec<u8>, bool) {
        if !self.options.compress || raw.len() < self.options.compress_threshold {
            return (raw.to_vec(), false);
        }
        match lz4::block::compress(raw, None, true) {
            Ok(compressed) if compressed.len() < raw.len() => (compressed, true),
            _ => (raw.to_vec(), false),
        }
    }

    /// Writes the `LedgerIndex`, then rewrites the `FileHeader` with the
    /// final ranges and `index_offset` (§4.8 Finalize). Does not fsync —
    /// callers writing to a real file should prefer
    /// [`Writer::finalize_and_sync`], which does.
    pub fn finalize(mut self) -> Result<WriterStats> {
        self.write_index_and_header()?;
        tracing::info!(
            ledgers = self.stats.ledgers_written,
            inner_nodes = self.stats.inner_nodes_written,
            leaf_nodes = self.stats.leaf_nodes_written,
            deduped = self.stats.nodes_deduped,
            compression_ratio = self.stats.compression_ratio(),
            "finalized v2 catalogue file"
        );
        Ok(self.stats)
    }

    fn write_index_and_header(&mut self) -> Result<()> {
        let index_offset = self.write_offset;
        let mut sorted = self.ledger_offsets.clone();
        sorted.sort_by_key(|(seq, _)| *seq);
        for (seq, abs) in &sorted {
            let entry = LedgerIndexEntry {
                seq: *seq,
                file_offset: *abs,
            };
            entry.encode(&mut self.out)?;
            self.write_offset += wire::LEDGER_INDEX_ENTRY_LEN as u64;
        }

        let header = FileHeader {
            network_id: self.options.network_id,
            flags: FLAG_HAS_INDEX,
            first_ledger: self.first_ledger.unwrap_or(0),
            last_ledger: self.last_ledger.unwrap_or(0),
            ledger_count: sorted.len() as u32,
            index_offset,
        };
        self.out.seek(SeekFrom::Start(0))?;
        self.out.write_all(&header.encode())?;
        self.out.flush()?;
        Ok(())
    }
}

impl Writer<std::fs::File> {
    /// `finalize`, plus an explicit `File::sync_all` — split out because
    /// the generic `finalize` above has no way to reach a non-file `Write`
    /// implementor's fsync.
    pub fn finalize_and_sync(mut self) -> Result<WriterStats> {
        self.write_index_and_header()?;
        self.out.sync_all().map_err(Error::Io)?;
        tracing::info!(
            ledgers = self.stats.ledgers_written,
            inner_nodes = self.stats.inner_nodes_written,
            leaf_nodes = self.stats.leaf_nodes_written,
            deduped = self.stats.nodes_deduped,
            compression_ratio = self.stats.compression_ratio(),
            "finalized v2 catalogue file (fsynced)"
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod writer_test;
