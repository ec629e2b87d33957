//! Rebuilding a subtree's internal nodes and root from its leaves.
//!
//! Two reconstruction semantics exist:
//!
//! - [`populate_map_subtree`]: a sparse, fixed-universe tree where every
//!   absent leaf holds the empty hash for its height.
//! - [`populate_log_subtree`]: a left-filled, append-only tree following
//!   compact Merkle tree rules for partial leaf counts.

mod log;
mod map;

pub use log::populate_log_subtree;
pub use map::populate_map_subtree;
use strata_merkle::{MapHasher, TreeHasher};

use crate::{Result, SubtreeRecord};

/// The reconstruction strategy a [`SubtreeCache`](crate::SubtreeCache) runs
/// over each dirty subtree before it is persisted.
#[derive(Debug, Clone)]
pub enum SubtreePopulator<H> {
    /// Sparse map semantics.
    Map(MapHasher<H>),
    /// Append-only log semantics.
    Log(H),
}

impl<H: TreeHasher> SubtreePopulator<H> {
    /// Map semantics over a sparse tree as deep as the hash is wide.
    pub fn map(hasher: H) -> Self {
        SubtreePopulator::Map(MapHasher::new(hasher))
    }

    /// Log semantics.
    pub fn log(hasher: H) -> Self {
        SubtreePopulator::Log(hasher)
    }

    /// Recompute `record.internal_nodes` and `record.root_hash` from
    /// `record.leaves`.
    pub fn repopulate(&self, record: &mut SubtreeRecord) -> Result<()> {
        match self {
            SubtreePopulator::Map(map_hasher) => populate_map_subtree(map_hasher, record),
            SubtreePopulator::Log(hasher) => populate_log_subtree(hasher, record),
        }
    }
}
