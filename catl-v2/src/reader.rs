//! Zero-copy reader over an mmap'd v2 catalogue file (§4.9). Every accessor
//! reads packed wire structs directly out of the mapping rather than
//! materializing owned copies of the tree, so random access into a
//! multi-gigabyte file costs only the page faults its traversal touches.

use crate::wire::{
    self, ChildType, FileHeader, InnerNodeHeader, LeafHeader, LedgerIndexEntry,
    INNER_NODE_HEADER_LEN,
};
use byteorder::{LittleEndian, ReadBytesExt};
use catl_ledger::LedgerHeader;
use catl_types::{Error, Key256, Result};
use memmap2::{Advice, Mmap};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Parallel/prefetch knobs for `walk_state_items`/`walk_tx_items` (§4.9,
/// §5). `num_threads == 0` lets `rayon` pick a pool size.
#[derive(Clone, Copy, Debug, Default)]
pub struct WalkOptions {
    pub parallel: bool,
    pub prefetch: bool,
    pub num_threads: usize,
}

/// An mmap-backed v2 catalogue file. Owns the mapping (behind an `Arc`, so
/// `catl-hybrid`'s `NodeRef::Mmap*` variants can cheaply clone a handle to
/// it); every slice handed out by a lookup or walk borrows from it and is
/// valid for exactly as long as this reader (or a clone of its `Arc`) is
/// alive.
pub struct CatalogueReader {
    mmap: Arc<Mmap>,
    header: FileHeader,
    index: Vec<LedgerIndexEntry>,
    current: Option<usize>,
}

impl CatalogueReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and owned exclusively by this
        // reader for its entire lifetime; nothing else in this process
        // truncates or otherwise invalidates the backing file while the
        // mapping is live. `CatalogueReader` never hands out a reference
        // that outlives `self`.
        let mmap = unsafe { memmap2::MmapOptions::new().map(&file)? };
        Self::from_mmap(mmap)
    }

    /// Builds a reader directly from an existing mapping — used by tests
    /// exercising property 7 (position-independence): re-mmap the same
    /// file at a fresh address and confirm reads agree.
    pub fn from_mmap(mmap: Mmap) -> Result<Self> {
        if mmap.len() < wire::FILE_HEADER_LEN {
            return Err(Error::CorruptFile("file shorter than FileHeader".into()));
        }
        let header = FileHeader::decode(&mmap[..wire::FILE_HEADER_LEN])?;
        if !header.has_index() {
            return Err(Error::CorruptFile(
                "v2 file has no ledger index (flag bit 0 unset)".into(),
            ));
        }
        let index = Self::parse_index(&mmap, &header)?;
        Ok(Self {
            mmap: Arc::new(mmap),
            header,
            index,
            current: None,
        })
    }

    /// A cheap (reference-counted) clone of the underlying mapping, for
    /// `catl-hybrid`'s `NodeRef::Mmap*` variants to hold directly rather
    /// than re-deriving raw pointers of their own.
    pub fn mmap_handle(&self) -> Arc<Mmap> {
        self.mmap.clone()
    }

    fn parse_index(mmap: &Mmap, header: &FileHeader) -> Result<Vec<LedgerIndexEntry>> {
        let start = header.index_offset as usize;
        let entry_len = wire::LEDGER_INDEX_ENTRY_LEN;
        let needed = start
            .checked_add(header.ledger_count as usize * entry_len)
            .ok_or_else(|| Error::CorruptFile("ledger index overflows file length".into()))?;
        if needed > mmap.len() {
            return Err(Error::CorruptFile(format!(
                "ledger index out of bounds: needs {needed} bytes, file is {} bytes",
                mmap.len()
            )));
        }
        let mut entries = Vec::with_capacity(header.ledger_count as usize);
        for i in 0..header.ledger_count as usize {
            let off = start + i * entry_len;
            entries.push(LedgerIndexEntry::decode(&mmap[off..off + entry_len])?);
        }
        entries.sort_by_key(|e| e.seq);
        Ok(entries)
    }

    pub fn header(&self) -> FileHeader {
        self.header
    }

    /// Binary searches the ledger index for `seq`; on success, positions
    /// this reader so `read_ledger_info`/`lookup_key_in_*` operate on that
    /// ledger.
    pub fn seek_to_ledger(&mut self, seq: u32) -> bool {
        match self.index.binary_search_by_key(&seq, |e| e.seq) {
            Ok(i) => {
                self.current = Some(i);
                true
            }
            Err(_) => false,
        }
    }

    fn current_ledger_offset(&self) -> Result<u64> {
        let i = self
            .current
            .ok_or_else(|| Error::CorruptFile("no ledger selected; call seek_to_ledger first".into()))?;
        Ok(self.index[i].file_offset)
    }

    /// Absolute byte offset of `seq`'s `LedgerEntry`, independent of
    /// `seek_to_ledger`'s cursor — used by `catl-hybrid`, which navigates by
    /// explicit offset rather than through the stateful "current ledger"
    /// API the rest of this type exposes.
    pub fn ledger_offset(&self, seq: u32) -> Result<u64> {
        self.index
            .binary_search_by_key(&seq, |e| e.seq)
            .map(|i| self.index[i].file_offset)
            .map_err(|_| Error::CorruptFile(format!("no ledger with seq {seq} in index")))
    }

    /// `(state_root_abs, tx_root_abs)` for `seq`, without disturbing
    /// `seek_to_ledger`'s cursor.
    pub fn tree_roots_for_seq(&self, seq: u32) -> Result<(u64, u64)> {
        let ledger_abs = self.ledger_offset(seq)?;
        self.tree_roots(ledger_abs)
    }

    /// The full mapped byte range. `catl-hybrid`'s `NodeRef::Mmap*` variants
    /// hold an `Arc` clone of this reader's mapping plus a byte offset into
    /// it rather than a raw pointer, so they stay valid for exactly as long
    /// as the mapping they were cloned from, with no unsafe code of their
    /// own beyond the one `Mmap::map` call already made in [`Self::open`].
    pub fn raw(&self) -> &[u8] {
        &self.mmap
    }

    /// Decodes the [`InnerNodeHeader`] at `abs`. `pub` (beyond this
    /// module's own traversal needs) for `catl-hybrid`'s materialization
    /// path, which must read the same header without going through
    /// `lookup_key`/`walk`.
    pub fn decode_inner_at(&self, abs: u64) -> Result<InnerNodeHeader> {
        let bytes = self.slice_at(abs, INNER_NODE_HEADER_LEN)?;
        InnerNodeHeader::decode(bytes)
    }

    /// Decodes the [`LeafHeader`] and borrows its payload at `abs`. See
    /// [`Self::decode_inner_at`] for why this is `pub`.
    pub fn decode_leaf_at(&self, abs: u64) -> Result<(LeafHeader, &[u8])> {
        self.read_leaf(abs)
    }

    /// Resolves the `rel_off` slot for `branch` under `inner` (located at
    /// `inner_abs`). See [`Self::decode_inner_at`] for why this is `pub`.
    pub fn child_offset(&self, inner_abs: u64, inner: &InnerNodeHeader, branch: u8) -> Result<u64> {
        self.resolve_child_offset(inner_abs, inner, branch)
    }

    fn slice_at(&self, abs: u64, len: usize) -> Result<&[u8]> {
        let start = abs as usize;
        let end = start
            .checked_add(len)
            .ok_or_else(|| Error::CorruptFile("offset arithmetic overflow".into()))?;
        if end > self.mmap.len() {
            tracing::error!(start, end, file_len = self.mmap.len(), "read past end of file");
            return Err(Error::CorruptFile(format!(
                "read [{start}, {end}) past end of file (len {})",
                self.mmap.len()
            )));
        }
        Ok(&self.mmap[start..end])
    }

    pub fn read_ledger_info(&self) -> Result<LedgerHeader> {
        let ledger_abs = self.current_ledger_offset()?;
        let bytes = self.slice_at(ledger_abs, catl_ledger::header::WIRE_LEN)?;
        LedgerHeader::decode(bytes)
    }

    fn tree_roots(&self, ledger_abs: u64) -> Result<(u64, u64)> {
        let header_len = catl_ledger::header::WIRE_LEN as u64;
        let state_slot = ledger_abs + header_len;
        let tx_slot = state_slot + 4;
        let state_rel = self.read_i32(state_slot)?;
        let tx_rel = self.read_i32(tx_slot)?;
        let state_abs = wire::resolve_rel_offset(state_slot, state_rel)?;
        let tx_abs = wire::resolve_rel_offset(tx_slot, tx_rel)?;
        Ok((state_abs, tx_abs))
    }

    fn read_i32(&self, abs: u64) -> Result<i32> {
        let bytes = self.slice_at(abs, 4)?;
        Ok(Cursor::new(bytes).read_i32::<LittleEndian>()?)
    }

    /// Looks up `key` in the current ledger's state tree.
    pub fn lookup_key_in_state(&self, key: &Key256) -> Result<Option<&[u8]>> {
        let ledger_abs = self.current_ledger_offset()?;
        let (state_abs, _) = self.tree_roots(ledger_abs)?;
        self.lookup_key(state_abs, key)
    }

    /// Looks up `key` in the current ledger's transaction tree.
    pub fn lookup_key_in_tx(&self, key: &Key256) -> Result<Option<&[u8]>> {
        let ledger_abs = self.current_ledger_offset()?;
        let (_, tx_abs) = self.tree_roots(ledger_abs)?;
        self.lookup_key(tx_abs, key)
    }

    fn lookup_key(&self, root_abs: u64, key: &Key256) -> Result<Option<&[u8]>> {
        let mut inner_abs = root_abs;
        loop {
            let header_bytes = self.slice_at(inner_abs, INNER_NODE_HEADER_LEN)?;
            let inner = InnerNodeHeader::decode(header_bytes)?;
            if inner.depth > 63 {
                return Err(Error::CorruptFile(format!(
                    "inner node depth {} out of range [0, 63]",
                    inner.depth
                )));
            }
            let branch = key.nibble(inner.depth as u16)?;
            match wire::get_child_type(inner.child_types, branch) {
                ChildType::Empty => return Ok(None),
                ChildType::Placeholder => {
                    return Err(Error::CorruptFile(format!(
                        "attempted traversal through a placeholder at branch {branch}"
                    )))
                }
                ChildType::Leaf => {
                    let child_abs = self.resolve_child_offset(inner_abs, &inner, branch)?;
                    let (leaf, payload) = self.read_leaf(child_abs)?;
                    return Ok(if &leaf.key == key { Some(payload) } else { None });
                }
                ChildType::Inner => {
                    inner_abs = self.resolve_child_offset(inner_abs, &inner, branch)?;
                }
            }
        }
    }

    /// Resolves the self-relative offset stored for `branch` in the sparse
    /// array following `inner`'s fixed header, popcount-indexed against
    /// `overlay_mask`.
    fn resolve_child_offset(
        &self,
        inner_abs: u64,
        inner: &InnerNodeHeader,
        branch: u8,
    ) -> Result<u64> {
        let slot_index = catl_types::util::popcount_below(inner.overlay_mask, branch);
        let slot_abs = inner_abs + INNER_NODE_HEADER_LEN as u64 + (slot_index as u64 * 4);
        let rel = self.read_i32(slot_abs)?;
        wire::resolve_rel_offset(slot_abs, rel)
    }

    fn read_leaf(&self, abs: u64) -> Result<(LeafHeader, &[u8])> {
        let fixed = self.slice_at(abs, wire::LEAF_HEADER_FIXED_LEN)?;
        let leaf = LeafHeader::decode(fixed)?;
        let payload_abs = abs + wire::LEAF_HEADER_FIXED_LEN as u64;
        let on_disk = self.slice_at(payload_abs, leaf.data_size as usize)?;
        Ok((leaf, on_disk))
    }

    /// Decompresses a leaf's on-disk payload if it was written compressed
    /// (lz4-block with an embedded size prefix — see `writer::maybe_compress`).
    pub fn decode_leaf_payload(&self, leaf: &LeafHeader, on_disk: &[u8]) -> Result<Vec<u8>> {
        if !leaf.compressed {
            return Ok(on_disk.to_vec());
        }
        lz4::block::decompress(on_disk, None)
            .map_err(|e| Error::CorruptFile(format!("lz4 decompress failed: {e}")))
    }

    /// Depth-first, sequential walk of every leaf in the current ledger's
    /// state tree. `f` returns `false` to stop early.
    pub fn walk_state_items(&self, f: impl FnMut(Key256, &[u8]) -> bool) -> Result<()> {
        let ledger_abs = self.current_ledger_offset()?;
        let (state_abs, _) = self.tree_roots(ledger_abs)?;
        self.walk(state_abs, f)
    }

    /// As [`Self::walk_state_items`], over the transaction tree instead.
    pub fn walk_tx_items(&self, f: impl FnMut(Key256, &[u8]) -> bool) -> Result<()> {
        let ledger_abs = self.current_ledger_offset()?;
        let (_, tx_abs) = self.tree_roots(ledger_abs)?;
        self.walk(tx_abs, f)
    }

    fn walk(&self, root_abs: u64, mut f: impl FnMut(Key256, &[u8]) -> bool) -> Result<()> {
        let mut stack = vec![root_abs];
        'outer: while let Some(abs) = stack.pop() {
            let header_bytes = self.slice_at(abs, INNER_NODE_HEADER_LEN)?;
            let inner = InnerNodeHeader::decode(header_bytes)?;
            for branch in (0u8..16).rev() {
                match wire::get_child_type(inner.child_types, branch) {
                    ChildType::Empty => continue,
                    ChildType::Placeholder => {
                        return Err(Error::CorruptFile(format!(
                            "walk hit a placeholder at branch {branch}"
                        )))
                    }
                    ChildType::Leaf => {
                        let child_abs = self.resolve_child_offset(abs, &inner, branch)?;
                        let (leaf, payload) = self.read_leaf(child_abs)?;
                        if !f(leaf.key, payload) {
                            break 'outer;
                        }
                    }
                    ChildType::Inner => {
                        let child_abs = self.resolve_child_offset(abs, &inner, branch)?;
                        stack.push(child_abs);
                    }
                }
            }
        }
        Ok(())
    }

    /// Parallel variant: partitions the root's top-level branches across a
    /// `rayon` thread pool and merges emissions. Ordering across branches
    /// (and within a branch, relative to other branches) is unspecified;
    /// within a single branch's own subtree, traversal is depth-first.
    /// Delivery is at-least-once: `f` may be invoked concurrently from
    /// multiple threads, so it must be `Sync`.
    pub fn walk_state_items_parallel(
        &self,
        opts: WalkOptions,
        f: impl Fn(Key256, &[u8]) -> bool + Sync,
    ) -> Result<()> {
        let ledger_abs = self.current_ledger_offset()?;
        let (state_abs, _) = self.tree_roots(ledger_abs)?;
        self.walk_parallel(state_abs, opts, f)
    }

    pub fn walk_tx_items_parallel(
        &self,
        opts: WalkOptions,
        f: impl Fn(Key256, &[u8]) -> bool + Sync,
    ) -> Result<()> {
        let ledger_abs = self.current_ledger_offset()?;
        let (_, tx_abs) = self.tree_roots(ledger_abs)?;
        self.walk_parallel(tx_abs, opts, f)
    }

    fn walk_parallel(
        &self,
        root_abs: u64,
        opts: WalkOptions,
        f: impl Fn(Key256, &[u8]) -> bool + Sync,
    ) -> Result<()> {
        if !opts.parallel {
            return self.walk(root_abs, |k, d| f(k, d));
        }
        if opts.prefetch {
            let _ = self.mmap.advise(Advice::WillNeed);
        }
        let header_bytes = self.slice_at(root_abs, INNER_NODE_HEADER_LEN)?;
        let inner = InnerNodeHeader::decode(header_bytes)?;
        let mut branch_roots = Vec::new();
        for branch in 0u8..16 {
            match wire::get_child_type(inner.child_types, branch) {
                ChildType::Empty => {}
                ChildType::Placeholder => {
                    return Err(Error::CorruptFile(format!(
                        "parallel walk hit a placeholder at branch {branch}"
                    )))
                }
                ChildType::Leaf => {
                    let child_abs = self.resolve_child_offset(root_abs, &inner, branch)?;
                    let (leaf, payload) = self.read_leaf(child_abs)?;
                    f(leaf.key, payload);
                }
                ChildType::Inner => {
                    let child_abs = self.resolve_child_offset(root_abs, &inner, branch)?;
                    branch_roots.push(child_abs);
                }
            }
        }

        let run = |roots: &[u64]| -> Result<()> {
            use rayon::prelude::*;
            roots
                .par_iter()
                .map(|&abs| self.walk(abs, |k, d| f(k, d)))
                .collect::<Result<Vec<()>>>()
                .map(|_| ())
        };
        if opts.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(opts.num_threads)
                .build()
                .map_err(|e| Error::CorruptFile(format!("failed to build rayon pool: {e}")))?;
            pool.install(|| run(&branch_roots))
        } else {
            run(&branch_roots)
        }
    }
}

#[cfg(test)]
mod reader_test;
