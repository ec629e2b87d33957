//! Tree hashers.
//!
//! Hash domain separation:
//! - Leaf nodes:     `H(0x00 || value)`
//! - Internal nodes: `H(0x01 || left_hash || right_hash)`

use sha2::{Digest, Sha256};

/// Size in bytes of every hash produced by a [`TreeHasher`].
pub const HASH_SIZE: usize = 32;

/// A node hash.
pub type Hash = [u8; HASH_SIZE];

/// Domain tag prepended to leaf hash inputs.
const LEAF_TAG: u8 = 0x00;
/// Domain tag prepended to internal merge inputs.
const INTERNAL_TAG: u8 = 0x01;

/// Digest and combination primitives shared by map and log trees.
pub trait TreeHasher: Clone + core::fmt::Debug {
    /// Hash a leaf value.
    fn digest(&self, leaf: &[u8]) -> Hash;

    /// Hash two sibling nodes into their parent.
    fn combine(&self, left: &Hash, right: &Hash) -> Hash;

    /// Root hash of a tree holding no leaves.
    fn empty_root(&self) -> Hash;

    /// Number of bits in a hash, which is also the depth of a sparse map
    /// keyed by hashes.
    fn size_bits(&self) -> usize {
        HASH_SIZE * 8
    }
}

/// SHA-256 tree hasher following RFC 6962.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc6962Hasher;

impl TreeHasher for Rfc6962Hasher {
    fn digest(&self, leaf: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update([LEAF_TAG]);
        hasher.update(leaf);
        hasher.finalize().into()
    }

    fn combine(&self, left: &Hash, right: &Hash) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update([INTERNAL_TAG]);
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }

    fn empty_root(&self) -> Hash {
        Sha256::digest(b"").into()
    }
}

/// Blake3 tree hasher using the same domain tags as [`Rfc6962Hasher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl TreeHasher for Blake3Hasher {
    fn digest(&self, leaf: &[u8]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[LEAF_TAG]);
        hasher.update(leaf);
        *hasher.finalize().as_bytes()
    }

    fn combine(&self, left: &Hash, right: &Hash) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[INTERNAL_TAG]);
        hasher.update(left);
        hasher.update(right);
        *hasher.finalize().as_bytes()
    }

    fn empty_root(&self) -> Hash {
        *blake3::hash(b"").as_bytes()
    }
}
