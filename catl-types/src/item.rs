//! Opaque leaf payloads: a non-owning byte view and the owned `(key, data)`
//! pair stored in a trie leaf.

use crate::key::Key256;
use std::sync::Arc;

/// A non-owning view of bytes. In the pure in-memory trie this simply wraps
/// an `Arc<[u8]>` (so clones are cheap and leaves can be shared across
/// snapshots); the mmap-backed reader hands out slices that borrow directly
/// from the mapping instead (see `catl-v2`), which is the "never outlives
/// its backing storage" case this type's contract exists to describe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Slice(Arc<[u8]>);

impl Slice {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Slice(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Slice {
    fn from(v: Vec<u8>) -> Self {
        Slice(v.into())
    }
}

impl From<&[u8]> for Slice {
    fn from(v: &[u8]) -> Self {
        Slice(Arc::from(v))
    }
}

impl AsRef<[u8]> for Slice {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An opaque `(key, data)` pair. The trie never interprets `data`; it is a
/// pure byte blob to every layer of this crate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    pub key: Key256,
    pub data: Slice,
}

impl Item {
    pub fn new(key: Key256, data: impl Into<Slice>) -> Self {
        Self {
            key,
            data: data.into(),
        }
    }
}
