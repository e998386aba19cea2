//! SHA-512/256 streaming hasher and the domain-separation prefixes used
//! throughout the trie. Hashing is always big-endian SHA-512 truncated to
//! its first 32 bytes; this module is the only place that touches `sha2`
//! directly so every other crate in the workspace goes through [`Hash256`].

use sha2::{Digest, Sha512};
use std::fmt;

/// 4-byte prefix prepended to an inner node's child hashes before hashing.
pub const INNER_PREFIX: [u8; 4] = [0x4D, 0x49, 0x4E, 0x00];
/// 4-byte prefix prepended to an account-state leaf's payload before hashing.
pub const LEAF_NODE_PREFIX: [u8; 4] = [0x4D, 0x4C, 0x4E, 0x00];
/// 4-byte prefix prepended to a transaction leaf's payload before hashing.
pub const TX_NODE_PREFIX: [u8; 4] = [0x53, 0x4E, 0x44, 0x00];

/// A 32-byte SHA-512/256 digest. Lexicographically ordered, hex-displayable,
/// and cheap to copy.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    pub const LEN: usize = 32;

    pub const fn zero() -> Self {
        Hash256([0u8; 32])
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 32 {
            return None;
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Some(Hash256(out))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl From<Hash256> for [u8; 32] {
    fn from(h: Hash256) -> Self {
        h.0
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Streaming SHA-512/256 hasher: feed prefix and body bytes in any number of
/// calls to [`Sha512Hash256::update`], then call [`Sha512Hash256::finish`] to
/// get the truncated 32-byte digest.
#[derive(Default)]
pub struct Sha512Hash256 {
    inner: Sha512,
}

impl Sha512Hash256 {
    pub fn new() -> Self {
        Self {
            inner: Sha512::new(),
        }
    }

    pub fn update(&mut self, bytes: impl AsRef<[u8]>) -> &mut Self {
        self.inner.update(bytes.as_ref());
        self
    }

    pub fn finish(self) -> Hash256 {
        let full = self.inner.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&full[..32]);
        Hash256(out)
    }
}

/// One-shot convenience wrapper around [`Sha512Hash256`] for the common case
/// of hashing a handful of byte slices with a leading domain prefix.
pub fn hash_with_prefix(prefix: &[u8], parts: &[&[u8]]) -> Hash256 {
    let mut h = Sha512Hash256::new();
    h.update(prefix);
    for part in parts {
        h.update(part);
    }
    h.finish()
}

#[cfg(test)]
mod hash_test;
