//! Subtree cache for stratified Merkle tree storage.
//!
//! A large binary Merkle tree (a sparse map with 256-bit keys, or an
//! append-only log) is stored as fixed-depth subtrees of
//! [`STRATA_DEPTH`] levels, one record per subtree. Leaves are the source of
//! truth: internal nodes and the root of each subtree are rebuilt from them
//! before every write.
//!
//! # Core types
//!
//! - [`NodeId`]: a node in the full tree, addressed by a bit path.
//! - [`Suffix`]: a node's position inside its subtree, stored as a base64
//!   key.
//! - [`SubtreeRecord`]: the persisted unit.
//! - [`SubtreeCache`]: read-through, write-back cache that fetches each
//!   subtree at most once and persists every dirty subtree in one batch.
//! - [`populate::SubtreePopulator`]: map or log reconstruction of a
//!   subtree's internal nodes.
//!
//! # Store traits
//!
//! - [`SubtreeStore`]: read one subtree, write a batch.
//! - [`MemSubtreeStore`]: in-memory store (requires `mem_store` feature).

#![warn(missing_docs)]

mod cache;
mod error;
mod node_id;
pub mod populate;
mod record;
mod split;
mod store;
mod suffix;

pub use cache::SubtreeCache;
pub use error::{Error, Result};
pub use node_id::NodeId;
pub use populate::SubtreePopulator;
pub use record::SubtreeRecord;
pub use split::{STRATA_DEPTH, split_node_id};
#[cfg(any(test, feature = "mem_store"))]
pub use store::MemSubtreeStore;
pub use store::SubtreeStore;
pub use strata_merkle::{Hash, TreeHasher};
pub use suffix::Suffix;
