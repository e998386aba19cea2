//! Crate-wide error vocabulary. Every fallible function in this workspace
//! returns [`Result<T>`]; library code never panics on malformed-but-reachable
//! input (corrupt files, bad offsets, caller-supplied depths out of range).

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kinds shared by `catl-shamap`, `catl-v2`, `catl-hybrid` and
/// `catl-ledger`. Named after the error kinds of the source format rather
/// than after any one subsystem, since several of these can surface from
/// more than one crate (e.g. `InvalidDepth` from both the in-memory trie and
/// the mmap reader).
#[derive(Debug, Error)]
pub enum Error {
    #[error("nibble depth {depth} out of range, key has {max} nibbles")]
    InvalidDepth { depth: u16, max: u16 },

    #[error("branch index {0} out of range [0, 16)")]
    InvalidBranch(u8),

    #[error("unexpected null node: {0}")]
    NullNode(&'static str),

    #[error("leaf node has no payload")]
    NullItem,

    #[error("hash calculation failed: {0}")]
    HashCalculation(String),

    #[error("collision resolution exceeded maximum trie depth")]
    MaxDepthExceeded,

    #[error("corrupt v2 file: {0}")]
    CorruptFile(String),

    #[error("key not found")]
    KeyNotFound,

    #[error("operation attempted on a version-mismatched (frozen) snapshot node")]
    VersionMismatch,

    #[error("no divergence found between keys in nibble range [{start}, {end})")]
    NoDivergence { start: u16, end: u16 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PartialEq for Error {
    /// Structural equality ignoring the exact wording of free-form message
    /// fields; tests assert on the error *kind*, not on rendered text.
    fn eq(&self, other: &Self) -> bool {
        use Error::*;
        match (self, other) {
            (InvalidDepth { depth: d1, max: m1 }, InvalidDepth { depth: d2, max: m2 }) => {
                d1 == d2 && m1 == m2
            }
            (InvalidBranch(a), InvalidBranch(b)) => a == b,
            (NullNode(a), NullNode(b)) => a == b,
            (NullItem, NullItem) => true,
            (HashCalculation(_), HashCalculation(_)) => true,
            (MaxDepthExceeded, MaxDepthExceeded) => true,
            (CorruptFile(_), CorruptFile(_)) => true,
            (KeyNotFound, KeyNotFound) => true,
            (VersionMismatch, VersionMismatch) => true,
            (NoDivergence { start: s1, end: e1 }, NoDivergence { start: s2, end: e2 }) => {
                s1 == s2 && e1 == e2
            }
            (Io(a), Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}
