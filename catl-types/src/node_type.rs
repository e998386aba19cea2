//! Discriminator distinguishing the several kinds of SHAMap a node can
//! belong to; this drives which hashing prefix a leaf uses and how a v1
//! stream record is interpreted (see `catl-ledger`).

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, FromPrimitive, ToPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum NodeType {
    Inner = 0,
    TxNoMeta = 2,
    TxWithMeta = 3,
    AccountState = 4,
    Remove = 254,
    Terminal = 255,
}

impl NodeType {
    /// Whether leaves of this type hash with [`crate::hash::TX_NODE_PREFIX`]
    /// rather than [`crate::hash::LEAF_NODE_PREFIX`].
    pub fn is_transaction(&self) -> bool {
        matches!(self, NodeType::TxNoMeta | NodeType::TxWithMeta)
    }
}
