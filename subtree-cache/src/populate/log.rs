use strata_merkle::{Hash, TreeHasher};
use tracing::trace;

use crate::{Error, Result, STRATA_DEPTH, Suffix, SubtreeRecord};

/// Rebuild an append-only log subtree.
///
/// The leaves must fill positions `0..k` with no gaps. A node whose right
/// subtree holds no leaves takes its left child's hash unchanged; otherwise
/// it combines both children. Only perfect (fully populated) nodes at depths
/// `1..STRATA_DEPTH` are written to `internal_nodes`, which matches the nodes
/// an incremental compact Merkle tree completes over the same leaves. An
/// empty subtree gets [`TreeHasher::empty_root`].
pub fn populate_log_subtree<H: TreeHasher>(hasher: &H, record: &mut SubtreeRecord) -> Result<()> {
    let leaf_count = record.leaves.len();
    if leaf_count > 1 << STRATA_DEPTH {
        return Err(Error::CorruptedData(format!(
            "log subtree {} has {} leaves",
            hex::encode(&record.prefix),
            leaf_count
        )));
    }

    let mut level: Vec<Hash> = Vec::with_capacity(leaf_count);
    for index in 0..leaf_count {
        let hash = record
            .leaves
            .get(&Suffix::leaf(index as u8).serialize())
            .ok_or_else(|| {
                Error::CorruptedData(format!(
                    "log subtree {} is missing leaf {} of {}",
                    hex::encode(&record.prefix),
                    index,
                    leaf_count
                ))
            })?;
        level.push(*hash);
    }

    record.internal_nodes.clear();
    if level.is_empty() {
        record.root_hash = Some(hasher.empty_root());
        return Ok(());
    }

    for height in 1..=STRATA_DEPTH {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hasher.combine(left, right),
                _ => pair[0],
            })
            .collect();

        let depth = STRATA_DEPTH - height;
        if depth > 0 {
            let perfect = leaf_count >> height;
            for (index, hash) in level.iter().take(perfect).enumerate() {
                let suffix = Suffix::for_position(depth as u8, index as u64)?;
                record.internal_nodes.insert(suffix.serialize(), *hash);
            }
        }
    }
    record.root_hash = Some(level[0]);

    trace!(
        prefix = %hex::encode(&record.prefix),
        leaves = leaf_count,
        internal = record.internal_nodes.len(),
        "repopulated log subtree"
    );
    Ok(())
}
