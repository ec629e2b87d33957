//! Merkle hashing primitives for strata subtree storage.
//!
//! # Core types
//!
//! - [`TreeHasher`]: leaf digest and child combination used by every tree.
//! - [`Rfc6962Hasher`]: SHA-256 with RFC 6962 domain tags.
//! - [`Blake3Hasher`]: the same tag scheme over Blake3.
//! - [`MapHasher`]: null-hash ladder for sparse Merkle maps.
//! - [`CompactMerkleTree`]: incremental append-only accumulator.

#![warn(missing_docs)]

mod compact;
mod hasher;
mod map_hasher;

pub use compact::CompactMerkleTree;
pub use hasher::{Blake3Hasher, HASH_SIZE, Hash, Rfc6962Hasher, TreeHasher};
pub use map_hasher::MapHasher;
