//! Null-hash ladder for sparse Merkle maps.

use crate::{Hash, TreeHasher};

/// A [`TreeHasher`] paired with the precomputed hashes of empty subtrees.
///
/// `empty_at_height(0)` is the digest of an empty leaf value; each higher
/// entry combines two copies of the one below it. A sparse map of depth `d`
/// has `empty_at_height(d)` as the root when no key is set.
#[derive(Debug, Clone)]
pub struct MapHasher<H> {
    hasher: H,
    empty_hashes: Vec<Hash>,
}

impl<H: TreeHasher> MapHasher<H> {
    /// Create a map hasher whose tree depth is the hash width in bits.
    pub fn new(hasher: H) -> Self {
        let depth = hasher.size_bits();
        Self::with_depth(hasher, depth)
    }

    /// Create a map hasher for a sparse tree of `tree_depth` levels.
    pub fn with_depth(hasher: H, tree_depth: usize) -> Self {
        let mut empty_hashes = Vec::with_capacity(tree_depth + 1);
        let mut current = hasher.digest(b"");
        empty_hashes.push(current);
        for _ in 0..tree_depth {
            current = hasher.combine(&current, &current);
            empty_hashes.push(current);
        }
        Self {
            hasher,
            empty_hashes,
        }
    }

    /// The wrapped tree hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Number of levels between the map root and its leaves.
    pub fn tree_depth(&self) -> usize {
        self.empty_hashes.len() - 1
    }

    /// Hash of an empty subtree whose root sits `height` levels above the
    /// leaves, or `None` if `height` exceeds the tree depth.
    pub fn empty_at_height(&self, height: usize) -> Option<&Hash> {
        self.empty_hashes.get(height)
    }

    /// Root hash of a map with no keys set.
    pub fn empty_root(&self) -> Hash {
        self.empty_hashes[self.tree_depth()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blake3Hasher, Rfc6962Hasher};

    /// Empty sparse Merkle tree root from the certificate-transparency
    /// SparseMerkleTree test vectors.
    const EMPTY_MAP_ROOT: &str = "c6689f10812a0980976d9533d83875282166159567ec35155716c1413af53d6a";

    #[test]
    fn test_empty_map_root_known_answer() {
        let mh = MapHasher::new(Rfc6962Hasher);
        assert_eq!(mh.tree_depth(), 256);
        assert_eq!(hex::encode(mh.empty_root()), EMPTY_MAP_ROOT);

        let below = mh.empty_at_height(255).expect("height 255");
        assert_eq!(
            hex::encode(mh.hasher().combine(below, below)),
            EMPTY_MAP_ROOT
        );
    }

    #[test]
    fn test_ladder_is_self_combination() {
        let mh = MapHasher::with_depth(Blake3Hasher, 16);
        let h = mh.hasher();
        assert_eq!(mh.empty_at_height(0), Some(&h.digest(b"")));
        for height in 1..=16 {
            let below = mh.empty_at_height(height - 1).expect("lower level");
            assert_eq!(mh.empty_at_height(height), Some(&h.combine(below, below)));
        }
        assert_eq!(mh.empty_at_height(17), None);
    }

    #[test]
    fn test_zero_depth_map() {
        let mh = MapHasher::with_depth(Rfc6962Hasher, 0);
        assert_eq!(mh.tree_depth(), 0);
        assert_eq!(mh.empty_root(), Rfc6962Hasher.digest(b""));
    }
}
