//! The persisted unit: one subtree's leaves, internal nodes and root.

use std::collections::BTreeMap;

use bincode::{Decode, Encode};
use strata_merkle::Hash;

use crate::{Error, NodeId, Result, STRATA_DEPTH, Suffix};

/// Upper bound on a decoded record, well above a fully populated subtree.
const MAX_ENCODED_RECORD_BYTES: usize = 1024 * 1024;

/// A subtree of `STRATA_DEPTH` levels stored as a single record.
///
/// Maps are keyed by [`Suffix::serialize`]. `leaves` only holds suffixes of
/// `STRATA_DEPTH` bits and `internal_nodes` only holds suffixes of
/// `1..STRATA_DEPTH` bits, so the two never share a key. The depth-0
/// position is `root_hash`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubtreeRecord {
    /// Whole-byte path of the subtree root within the full tree.
    pub prefix: Vec<u8>,
    /// Leaf hashes keyed by serialized suffix.
    ///
    /// Only `STRATA_DEPTH`-bit suffixes belong here. The reconstructors
    /// reject a record holding any other key with [`Error::CorruptedData`].
    pub leaves: BTreeMap<String, Hash>,
    /// Internal node hashes keyed by serialized suffix.
    ///
    /// Derived data: the reconstructors clear and rebuild this map from
    /// `leaves`, so keys written here by hand do not survive a flush.
    pub internal_nodes: BTreeMap<String, Hash>,
    /// Hash of the subtree root, once computed or set.
    pub root_hash: Option<Hash>,
}

impl SubtreeRecord {
    /// An empty record for the subtree at `prefix`.
    pub fn new(prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            ..Default::default()
        }
    }

    /// Address of this subtree's root.
    pub fn subtree_id(&self) -> NodeId {
        NodeId::for_subtree_prefix(&self.prefix)
    }

    /// Number of populated leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Hash stored at `suffix`, routed to the root, leaf or internal map by
    /// the suffix depth.
    pub fn get(&self, suffix: &Suffix) -> Option<&Hash> {
        match suffix.bits() as usize {
            0 => self.root_hash.as_ref(),
            STRATA_DEPTH => self.leaves.get(&suffix.serialize()),
            _ => self.internal_nodes.get(&suffix.serialize()),
        }
    }

    /// Store `hash` at `suffix`, routed as in [`get`](Self::get).
    pub fn set(&mut self, suffix: &Suffix, hash: Hash) {
        match suffix.bits() as usize {
            0 => self.root_hash = Some(hash),
            STRATA_DEPTH => {
                self.leaves.insert(suffix.serialize(), hash);
            }
            _ => {
                self.internal_nodes.insert(suffix.serialize(), hash);
            }
        }
    }

    /// Serialize this record to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        bincode::encode_to_vec(self, config).map_err(|e| {
            Error::CorruptedData(format!(
                "failed to encode subtree {}: {}",
                hex::encode(&self.prefix),
                e
            ))
        })
    }

    /// Deserialize a record from bytes.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<MAX_ENCODED_RECORD_BYTES>();
        let (record, _) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| Error::CorruptedData(format!("failed to decode subtree: {}", e)))?;
        Ok(record)
    }
}
