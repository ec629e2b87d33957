//! Full-tree node addressing.

use std::{fmt, hash};

use crate::{Error, Result};

/// A node in the full binary tree, addressed by the leading `depth_bits`
/// bits of `path`.
///
/// Bits of `path` past `depth_bits` are ignored by equality, hashing and
/// display.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawNodeId"))]
pub struct NodeId {
    path: Vec<u8>,
    depth_bits: usize,
}

/// Unchecked serde form of [`NodeId`], validated through [`NodeId::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawNodeId {
    path: Vec<u8>,
    depth_bits: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawNodeId> for NodeId {
    type Error = Error;

    fn try_from(raw: RawNodeId) -> Result<Self> {
        Self::new(raw.path, raw.depth_bits)
    }
}

impl NodeId {
    /// Create a node id from a path and the number of significant bits.
    ///
    /// Fails if `depth_bits` exceeds the bits available in `path`.
    pub fn new(path: Vec<u8>, depth_bits: usize) -> Result<Self> {
        if depth_bits > path.len() * 8 {
            return Err(Error::InvalidInput(format!(
                "depth {} exceeds path length of {} bits",
                depth_bits,
                path.len() * 8
            )));
        }
        Ok(Self { path, depth_bits })
    }

    /// Node id whose every bit of `hash` is significant, e.g. a map leaf.
    pub fn from_hash(hash: &[u8]) -> Self {
        Self {
            path: hash.to_vec(),
            depth_bits: hash.len() * 8,
        }
    }

    /// Address of the subtree stored under `prefix`.
    pub fn for_subtree_prefix(prefix: &[u8]) -> Self {
        Self::from_hash(prefix)
    }

    /// Node id for tree coordinates: the `index`-th node (left to right)
    /// at `height` levels above the leaves of a tree with `max_path_bits`
    /// levels.
    pub fn for_tree_coords(height: usize, index: u64, max_path_bits: usize) -> Result<Self> {
        if max_path_bits % 8 != 0 {
            return Err(Error::InvalidInput(format!(
                "max path bits {} is not a whole number of bytes",
                max_path_bits
            )));
        }
        let depth_bits = max_path_bits.checked_sub(height).ok_or_else(|| {
            Error::InvalidInput(format!(
                "height {} exceeds tree depth {}",
                height, max_path_bits
            ))
        })?;
        if depth_bits < 64 && index >> depth_bits != 0 {
            return Err(Error::InvalidInput(format!(
                "index {} out of range at height {} of a {}-bit tree",
                index, height, max_path_bits
            )));
        }

        let mut path = vec![0u8; max_path_bits / 8];
        for bit in 0..depth_bits {
            let shift = depth_bits - 1 - bit;
            if shift < 64 && (index >> shift) & 1 == 1 {
                path[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(Self { path, depth_bits })
    }

    /// The same path truncated or extended to `depth_bits` significant bits.
    pub fn with_depth(&self, depth_bits: usize) -> Result<Self> {
        Self::new(self.path.clone(), depth_bits)
    }

    /// Raw path bytes, including any bits past the depth.
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// Number of significant leading bits.
    pub fn depth_bits(&self) -> usize {
        self.depth_bits
    }

    /// Bit `i` of the path, counted from the most significant bit of the
    /// first byte.
    pub fn bit(&self, i: usize) -> bool {
        self.path
            .get(i / 8)
            .is_some_and(|byte| byte & (0x80 >> (i % 8)) != 0)
    }

    /// Siblings of every node on the path from this node up to (excluding)
    /// the root, deepest first.
    pub fn siblings(&self) -> Vec<NodeId> {
        (1..=self.depth_bits)
            .rev()
            .map(|depth| {
                let mut path = self.path.clone();
                clear_bits_from(&mut path, depth);
                path[(depth - 1) / 8] ^= 0x80 >> ((depth - 1) % 8);
                NodeId {
                    path,
                    depth_bits: depth,
                }
            })
            .collect()
    }

    /// Significant bytes with the bits past `depth_bits` cleared.
    fn significant_bytes(&self) -> Vec<u8> {
        let mut bytes = self.path[..self.depth_bits.div_ceil(8)].to_vec();
        clear_bits_from(&mut bytes, self.depth_bits);
        bytes
    }
}

/// Zero every bit at position `from` and beyond.
fn clear_bits_from(path: &mut [u8], from: usize) {
    for (i, byte) in path.iter_mut().enumerate() {
        let start = i * 8;
        if start >= from {
            *byte = 0;
        } else if from - start < 8 {
            *byte &= 0xFFu8 << (8 - (from - start));
        }
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.depth_bits == other.depth_bits && self.significant_bytes() == other.significant_bytes()
    }
}

impl Eq for NodeId {}

impl hash::Hash for NodeId {
    fn hash<S: hash::Hasher>(&self, state: &mut S) {
        self.depth_bits.hash(state);
        self.significant_bytes().hash(state);
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth_bits == 0 {
            return write!(f, "<root>");
        }
        for i in 0..self.depth_bits {
            write!(f, "{}", if self.bit(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}
