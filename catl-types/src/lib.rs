// Copyright (c) Catalogue Tools Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Shared primitives for the catalogue-tools workspace: the 256-bit
//! [`hash::Hash256`] and [`key::Key256`] types, the opaque leaf [`item::Item`],
//! the crate-wide [`error::Error`] hierarchy, and the small bit-twiddling
//! [`util`] helpers every branch container in `catl-shamap` and `catl-v2`
//! builds on.

pub mod error;
pub mod hash;
pub mod item;
pub mod key;
pub mod logging;
pub mod node_type;
pub mod util;

pub use error::{Error, Result};
pub use hash::Hash256;
pub use item::{Item, Slice};
pub use key::Key256;
pub use node_type::NodeType;
