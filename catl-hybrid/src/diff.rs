//! `MemTree` diff (§4.11): compares two v2 subtrees directly over mmap
//! memory, without materializing either side onto the heap.
//!
//! The core difficulty `catl_shamap::diff` sidesteps by always walking two
//! in-memory trees branch-for-branch at the same nominal depth: a collapsed
//! tree's immediate children can sit at arbitrary depths below their parent,
//! so the *same* branch index on the two sides being compared need not
//! correspond to the same nibble position in the original key once their
//! collapse shapes diverge. This module aligns explicitly: at every paired
//! `(a, b)`, if their depths differ, the shallower side is read normally (16
//! real children at its own depth) while the deeper side is "projected" —
//! treated as occupying exactly one branch of that shallower depth (the one
//! its own representative key would take), appearing as `Empty` everywhere
//! else — and the pair is re-evaluated one level down. Recursion terminates
//! because this either reaches a shared depth or bottoms out at a leaf.

use catl_types::{Error, Key256, Result};
use catl_v2::wire::{self, ChildType, InnerNodeHeader};
use catl_v2::CatalogueReader;

/// One observed difference between two state or transaction trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemDiffEntry {
    Added { key: Key256, data: Vec<u8> },
    Deleted { key: Key256, data: Vec<u8> },
    Modified {
        key: Key256,
        before: Vec<u8>,
        after: Vec<u8>,
    },
}

/// A node as seen from one side of the diff: either absent, a leaf, or an
/// inner node at a known depth. Copy since it only ever holds a shared
/// reference and two integers.
#[derive(Clone, Copy)]
enum Side<'a> {
    Empty,
    Leaf { reader: &'a CatalogueReader, offset: u64 },
    Inner {
        reader: &'a CatalogueReader,
        offset: u64,
        depth: u8,
    },
}

/// Diffs the state trees of `seq_a` in `reader_a` against `seq_b` in
/// `reader_b` (which may be the same reader, e.g. two ledgers in one file).
/// `on_entry` may return `false` to stop the walk early.
pub fn diff_ledger_state(
    reader_a: &CatalogueReader,
    seq_a: u32,
    reader_b: &CatalogueReader,
    seq_b: u32,
    on_entry: impl FnMut(MemDiffEntry) -> bool,
) -> Result<()> {
    let (state_a, _) = reader_a.tree_roots_for_seq(seq_a)?;
    let (state_b, _) = reader_b.tree_roots_for_seq(seq_b)?;
    diff(reader_a, state_a, reader_b, state_b, on_entry)
}

/// As [`diff_ledger_state`], over the transaction tree instead.
pub fn diff_ledger_tx(
    reader_a: &CatalogueReader,
    seq_a: u32,
    reader_b: &CatalogueReader,
    seq_b: u32,
    on_entry: impl FnMut(MemDiffEntry) -> bool,
) -> Result<()> {
    let (_, tx_a) = reader_a.tree_roots_for_seq(seq_a)?;
    let (_, tx_b) = reader_b.tree_roots_for_seq(seq_b)?;
    diff(reader_a, tx_a, reader_b, tx_b, on_entry)
}

/// Diffs the subtree rooted at `offset_a` in `reader_a` against the one
/// rooted at `offset_b` in `reader_b`.
pub fn diff(
    reader_a: &CatalogueReader,
    offset_a: u64,
    reader_b: &CatalogueReader,
    offset_b: u64,
    mut on_entry: impl FnMut(MemDiffEntry) -> bool,
) -> Result<()> {
    let header_a = reader_a.decode_inner_at(offset_a)?;
    let header_b = reader_b.decode_inner_at(offset_b)?;
    let a = Side::Inner {
        reader: reader_a,
        offset: offset_a,
        depth: header_a.depth,
    };
    let b = Side::Inner {
        reader: reader_b,
        offset: offset_b,
        depth: header_b.depth,
    };
    diff_node(a, b, &mut on_entry)?;
    Ok(())
}

fn real_child<'a>(
    reader: &'a CatalogueReader,
    parent_offset: u64,
    header: &InnerNodeHeader,
    branch: u8,
) -> Result<Side<'a>> {
    match wire::get_child_type(header.child_types, branch) {
        ChildType::Empty => Ok(Side::Empty),
        ChildType::Placeholder => Err(Error::CorruptFile(format!(
            "diff hit a placeholder at branch {branch}"
        ))),
        ChildType::Leaf => {
            let abs = reader.child_offset(parent_offset, header, branch)?;
            Ok(Side::Leaf { reader, offset: abs })
        }
        ChildType::Inner => {
            let abs = reader.child_offset(parent_offset, header, branch)?;
            let child_header = reader.decode_inner_at(abs)?;
            Ok(Side::Inner {
                reader,
                offset: abs,
                depth: child_header.depth,
            })
        }
    }
}

fn representative_key(reader: &CatalogueReader, offset: u64) -> Result<Option<Key256>> {
    let header = reader.decode_inner_at(offset)?;
    for branch in 0u8..16 {
        match wire::get_child_type(header.child_types, branch) {
            ChildType::Empty => continue,
            ChildType::Placeholder => {
                return Err(Error::CorruptFile(format!(
                    "representative-key walk hit a placeholder at branch {branch}"
                )))
            }
            ChildType::Leaf => {
                let abs = reader.child_offset(offset, &header, branch)?;
                let (leaf, _) = reader.decode_leaf_at(abs)?;
                return Ok(Some(leaf.key));
            }
            ChildType::Inner => {
                let abs = reader.child_offset(offset, &header, branch)?;
                return representative_key(reader, abs);
            }
        }
    }
    Ok(None)
}

/// Emits `Added`/`Deleted` for every leaf in the subtree at `offset`, in
/// ascending branch order, skipping `except` if it appears. Returns `false`
/// if `on_entry` asked to stop.
fn collect_subtree(
    reader: &CatalogueReader,
    offset: u64,
    except: Option<Key256>,
    added: bool,
    on_entry: &mut impl FnMut(MemDiffEntry) -> bool,
) -> Result<bool> {
    let header = reader.decode_inner_at(offset)?;
    for branch in 0u8..16 {
        match wire::get_child_type(header.child_types, branch) {
            ChildType::Empty => {}
            ChildType::Placeholder => {
                return Err(Error::CorruptFile(format!(
                    "diff hit a placeholder at branch {branch}"
                )))
            }
            ChildType::Leaf => {
                let abs = reader.child_offset(offset, &header, branch)?;
                let (leaf, payload) = reader.decode_leaf_at(abs)?;
                if except == Some(leaf.key) {
                    continue;
                }
                let data = reader.decode_leaf_payload(&leaf, payload)?;
                let entry = if added {
                    MemDiffEntry::Added { key: leaf.key, data }
                } else {
                    MemDiffEntry::Deleted { key: leaf.key, data }
                };
                if !on_entry(entry) {
                    return Ok(false);
                }
            }
            ChildType::Inner => {
                let abs = reader.child_offset(offset, &header, branch)?;
                if !collect_subtree(reader, abs, except, added, on_entry)? {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

fn lookup_in_subtree(reader: &CatalogueReader, offset: u64, key: Key256) -> Result<Option<Vec<u8>>> {
    let mut current = offset;
    loop {
        let header = reader.decode_inner_at(current)?;
        let branch = key.nibble(header.depth as u16)?;
        match wire::get_child_type(header.child_types, branch) {
            ChildType::Empty => return Ok(None),
            ChildType::Placeholder => {
                return Err(Error::CorruptFile(format!(
                    "diff lookup hit a placeholder at branch {branch}"
                )))
            }
            ChildType::Leaf => {
                let abs = reader.child_offset(current, &header, branch)?;
                let (leaf, payload) = reader.decode_leaf_at(abs)?;
                return if leaf.key == key {
                    Ok(Some(reader.decode_leaf_payload(&leaf, payload)?))
                } else {
                    Ok(None)
                };
            }
            ChildType::Inner => {
                current = reader.child_offset(current, &header, branch)?;
            }
        }
    }
}

/// Returns `Ok(false)` if the walk was stopped early by `on_entry`.
fn diff_node(a: Side, b: Side, on_entry: &mut impl FnMut(MemDiffEntry) -> bool) -> Result<bool> {
    match (a, b) {
        (Side::Empty, Side::Empty) => Ok(true),

        (Side::Leaf { reader: ra, offset: oa }, Side::Leaf { reader: rb, offset: ob }) => {
            let (la, pa) = ra.decode_leaf_at(oa)?;
            let (lb, pb) = rb.decode_leaf_at(ob)?;
            if la.key == lb.key {
                if la.hash == lb.hash {
                    return Ok(true);
                }
                let before = ra.decode_leaf_payload(&la, pa)?;
                let after = rb.decode_leaf_payload(&lb, pb)?;
                if before == after {
                    return Ok(true);
                }
                Ok(on_entry(MemDiffEntry::Modified {
                    key: la.key,
                    before,
                    after,
                }))
            } else {
                let before = ra.decode_leaf_payload(&la, pa)?;
                if !on_entry(MemDiffEntry::Deleted { key: la.key, data: before }) {
                    return Ok(false);
                }
                let after = rb.decode_leaf_payload(&lb, pb)?;
                Ok(on_entry(MemDiffEntry::Added { key: lb.key, data: after }))
            }
        }

        (Side::Empty, Side::Leaf { reader, offset }) => {
            let (l, p) = reader.decode_leaf_at(offset)?;
            let data = reader.decode_leaf_payload(&l, p)?;
            Ok(on_entry(MemDiffEntry::Added { key: l.key, data }))
        }
        (Side::Leaf { reader, offset }, Side::Empty) => {
            let (l, p) = reader.decode_leaf_at(offset)?;
            let data = reader.decode_leaf_payload(&l, p)?;
            Ok(on_entry(MemDiffEntry::Deleted { key: l.key, data }))
        }

        (Side::Empty, Side::Inner { reader, offset, .. }) => {
            collect_subtree(reader, offset, None, true, on_entry)
        }
        (Side::Inner { reader, offset, .. }, Side::Empty) => {
            collect_subtree(reader, offset, None, false, on_entry)
        }

        (Side::Leaf { reader: ra, offset: oa }, Side::Inner { reader: rb, offset: ob, .. }) => {
            let (la, pa) = ra.decode_leaf_at(oa)?;
            match lookup_in_subtree(rb, ob, la.key)? {
                Some(after) => {
                    let before = ra.decode_leaf_payload(&la, pa)?;
                    if before != after
                        && !on_entry(MemDiffEntry::Modified {
                            key: la.key,
                            before,
                            after,
                        })
                    {
                        return Ok(false);
                    }
                }
                None => {
                    let before = ra.decode_leaf_payload(&la, pa)?;
                    if !on_entry(MemDiffEntry::Deleted { key: la.key, data: before }) {
                        return Ok(false);
                    }
                }
            }
            collect_subtree(rb, ob, Some(la.key), true, on_entry)
        }
        (Side::Inner { reader: ra, offset: oa, .. }, Side::Leaf { reader: rb, offset: ob }) => {
            let (lb, pb) = rb.decode_leaf_at(ob)?;
            match lookup_in_subtree(ra, oa, lb.key)? {
                Some(before) => {
                    let after = rb.decode_leaf_payload(&lb, pb)?;
                    if before != after
                        && !on_entry(MemDiffEntry::Modified {
                            key: lb.key,
                            before,
                            after,
                        })
                    {
                        return Ok(false);
                    }
                }
                None => {
                    let after = rb.decode_leaf_payload(&lb, pb)?;
                    if !on_entry(MemDiffEntry::Added { key: lb.key, data: after }) {
                        return Ok(false);
                    }
                }
            }
            collect_subtree(ra, oa, Some(lb.key), false, on_entry)
        }

        (
            Side::Inner { reader: ra, offset: oa, depth: da },
            Side::Inner { reader: rb, offset: ob, depth: db },
        ) => {
            if std::ptr::eq(ra, rb) && oa == ob {
                return Ok(true);
            }
            let ha = ra.decode_inner_at(oa)?;
            let hb = rb.decode_inner_at(ob)?;
            if ha.hash == hb.hash {
                return Ok(true);
            }
            if da == db {
                for branch in 0u8..16 {
                    let ca = real_child(ra, oa, &ha, branch)?;
                    let cb = real_child(rb, ob, &hb, branch)?;
                    if !diff_node(ca, cb, on_entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            } else if da < db {
                let proj_branch = representative_key(rb, ob)?
                    .map(|k| k.nibble(da as u16))
                    .transpose()?;
                for branch in 0u8..16 {
                    let ca = real_child(ra, oa, &ha, branch)?;
                    let cb = if Some(branch) == proj_branch { b } else { Side::Empty };
                    if !diff_node(ca, cb, on_entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            } else {
                let proj_branch = representative_key(ra, oa)?
                    .map(|k| k.nibble(db as u16))
                    .transpose()?;
                for branch in 0u8..16 {
                    let ca = if Some(branch) == proj_branch { a } else { Side::Empty };
                    let cb = real_child(rb, ob, &hb, branch)?;
                    if !diff_node(ca, cb, on_entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod diff_test;
