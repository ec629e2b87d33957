//! Compact (incremental) Merkle tree.
//!
//! Holds one perfect-subtree root per set bit of the leaf count, so
//! appending is `O(log n)` and the tree head can be produced without access
//! to earlier leaves.

use crate::{Hash, TreeHasher};

/// Append-only Merkle accumulator with RFC 6962 tree-head semantics.
#[derive(Debug, Clone)]
pub struct CompactMerkleTree<H> {
    hasher: H,
    /// `nodes[h]` is the root of the perfect subtree of height `h` when bit
    /// `h` of `size` is set.
    nodes: Vec<Option<Hash>>,
    size: u64,
}

impl<H: TreeHasher> CompactMerkleTree<H> {
    /// Create an empty tree.
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            nodes: Vec::new(),
            size: 0,
        }
    }

    /// Number of leaves appended so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` if no leaf has been appended.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Digest `data` and append it as the next leaf.
    ///
    /// Returns the leaf hash. See [`add_leaf_hash`](Self::add_leaf_hash) for
    /// the callback contract.
    pub fn add_leaf<F>(&mut self, data: &[u8], on_node: F) -> Hash
    where
        F: FnMut(usize, u64, &Hash),
    {
        let leaf_hash = self.hasher.digest(data);
        self.add_leaf_hash(leaf_hash, on_node);
        leaf_hash
    }

    /// Append a precomputed leaf hash.
    ///
    /// `on_node(height, index, hash)` is called for the leaf itself
    /// (height 0) and then for every perfect subtree this append completes,
    /// lowest first. `index` counts nodes left to right within `height`.
    pub fn add_leaf_hash<F>(&mut self, leaf_hash: Hash, mut on_node: F)
    where
        F: FnMut(usize, u64, &Hash),
    {
        let index = self.size;
        on_node(0, index, &leaf_hash);

        let mut hash = leaf_hash;
        let mut height = 0;
        while index & (1 << height) != 0 {
            if let Some(left) = self.nodes.get_mut(height).and_then(Option::take) {
                hash = self.hasher.combine(&left, &hash);
            }
            height += 1;
            on_node(height, index >> height, &hash);
        }

        if self.nodes.len() <= height {
            self.nodes.resize(height + 1, None);
        }
        self.nodes[height] = Some(hash);
        self.size += 1;
    }

    /// The current tree head.
    ///
    /// Perfect subtrees are folded right to left, which yields the RFC 6962
    /// Merkle tree hash for any leaf count. An empty tree returns
    /// [`TreeHasher::empty_root`].
    pub fn root(&self) -> Hash {
        let mut root: Option<Hash> = None;
        for node in self.nodes.iter().flatten() {
            root = Some(match root {
                None => *node,
                Some(right) => self.hasher.combine(node, &right),
            });
        }
        root.unwrap_or_else(|| self.hasher.empty_root())
    }
}
