use strata_merkle::{Hash, MapHasher, TreeHasher};
use tracing::trace;

use crate::{Error, Result, STRATA_DEPTH, Suffix, SubtreeRecord};

/// Rebuild a sparse map subtree.
///
/// Absent leaves take the empty hash for the height of the subtree's leaf
/// level above the map's leaves, `tree_depth - prefix_bits - STRATA_DEPTH`.
/// Every internal position at depths `1..STRATA_DEPTH` is written, including
/// positions whose hash equals the empty hash for their height.
pub fn populate_map_subtree<H: TreeHasher>(
    map_hasher: &MapHasher<H>,
    record: &mut SubtreeRecord,
) -> Result<()> {
    let prefix_bits = record.prefix.len() * 8;
    let empty_leaf = map_hasher
        .tree_depth()
        .checked_sub(prefix_bits + STRATA_DEPTH)
        .and_then(|height| map_hasher.empty_at_height(height))
        .ok_or_else(|| {
            Error::CorruptedData(format!(
                "subtree {} at depth {} lies below a map of depth {}",
                hex::encode(&record.prefix),
                prefix_bits,
                map_hasher.tree_depth()
            ))
        })?;

    let mut level: Vec<Hash> = vec![*empty_leaf; 1 << STRATA_DEPTH];
    for (key, hash) in &record.leaves {
        let suffix = Suffix::deserialize(key).map_err(|e| {
            Error::CorruptedData(format!(
                "subtree {} has a bad leaf key: {}",
                hex::encode(&record.prefix),
                e
            ))
        })?;
        if suffix.bits() as usize != STRATA_DEPTH {
            return Err(Error::CorruptedData(format!(
                "unexpected non-leaf suffix {} in leaves of subtree {}",
                suffix,
                hex::encode(&record.prefix)
            )));
        }
        level[suffix.value() as usize] = *hash;
    }

    let hasher = map_hasher.hasher();
    record.internal_nodes.clear();
    for depth in (0..STRATA_DEPTH).rev() {
        level = level
            .chunks(2)
            .map(|pair| hasher.combine(&pair[0], &pair[1]))
            .collect();
        if depth > 0 {
            for (index, hash) in level.iter().enumerate() {
                let suffix = Suffix::for_position(depth as u8, index as u64)?;
                record.internal_nodes.insert(suffix.serialize(), *hash);
            }
        }
    }
    record.root_hash = Some(level[0]);

    trace!(
        prefix = %hex::encode(&record.prefix),
        leaves = record.leaves.len(),
        "repopulated map subtree"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use strata_merkle::Rfc6962Hasher;

    use super::*;

    /// Expand the sparse subtree explicitly and hash the node at
    /// (`depth`, `index`).
    fn expand(
        map_hasher: &MapHasher<Rfc6962Hasher>,
        record: &SubtreeRecord,
        empty_leaf: &Hash,
        depth: u8,
        index: u64,
    ) -> Hash {
        if depth as usize == STRATA_DEPTH {
            return record
                .leaves
                .get(&Suffix::leaf(index as u8).serialize())
                .copied()
                .unwrap_or(*empty_leaf);
        }
        let left = expand(map_hasher, record, empty_leaf, depth + 1, 2 * index);
        let right = expand(map_hasher, record, empty_leaf, depth + 1, 2 * index + 1);
        map_hasher.hasher().combine(&left, &right)
    }

    fn leaf_hash(i: u32) -> Hash {
        Rfc6962Hasher.digest(format!("leaf {}", i).as_bytes())
    }

    #[test]
    fn test_known_answer_root() {
        let map_hasher = MapHasher::with_depth(Rfc6962Hasher, 8);
        let mut record = SubtreeRecord::new(Vec::new());
        for i in [0u32, 5, 200] {
            record.set(&Suffix::leaf(i as u8), leaf_hash(i));
        }
        populate_map_subtree(&map_hasher, &mut record).expect("populate");
        assert_eq!(
            record.root_hash.map(hex::encode).as_deref(),
            Some("7e554d213c1e7461838fdf14952edce78714fae8da217eefaa3e37e49f0b166d")
        );
        assert_eq!(record.internal_nodes.len(), 254);
    }

    #[test]
    fn test_matches_explicit_expansion() {
        let map_hasher = MapHasher::new(Rfc6962Hasher);
        let mut record = SubtreeRecord::new(vec![0x5a; 3]);
        for i in [1u32, 2, 3, 64, 127, 128, 254, 255] {
            record.set(&Suffix::leaf(i as u8), leaf_hash(i));
        }
        // stale values must be overwritten
        record.root_hash = Some([0xee; 32]);
        record
            .internal_nodes
            .insert(Suffix::for_position(1, 0).expect("valid").serialize(), [0xee; 32]);

        populate_map_subtree(&map_hasher, &mut record).expect("populate");

        let empty_leaf = *map_hasher.empty_at_height(256 - 24 - 8).expect("in range");
        assert_eq!(
            record.root_hash,
            Some(expand(&map_hasher, &record, &empty_leaf, 0, 0))
        );
        for depth in 1..STRATA_DEPTH as u8 {
            for index in 0..(1u64 << depth) {
                let key = Suffix::for_position(depth, index).expect("valid").serialize();
                assert_eq!(
                    record.internal_nodes.get(&key),
                    Some(&expand(&map_hasher, &record, &empty_leaf, depth, index)),
                    "depth {} index {}",
                    depth,
                    index
                );
            }
        }
        assert_eq!(record.leaves.len(), 8);
    }

    #[test]
    fn test_empty_subtree_root_is_empty_hash() {
        let map_hasher = MapHasher::new(Rfc6962Hasher);
        let mut record = SubtreeRecord::new(Vec::new());
        populate_map_subtree(&map_hasher, &mut record).expect("populate");
        assert_eq!(record.root_hash, Some(map_hasher.empty_root()));
        assert_eq!(
            record.root_hash.map(hex::encode).as_deref(),
            Some("c6689f10812a0980976d9533d83875282166159567ec35155716c1413af53d6a")
        );

        let mut deep = SubtreeRecord::new(vec![0; 31]);
        populate_map_subtree(&map_hasher, &mut deep).expect("populate");
        assert_eq!(deep.root_hash, map_hasher.empty_at_height(8).copied());
    }

    #[test]
    fn test_single_key_propagates_through_every_stratum() {
        let map_hasher = MapHasher::new(Rfc6962Hasher);
        let hasher = map_hasher.hasher();
        let key: Vec<u8> = (0u8..32).map(|i| i.wrapping_mul(37) ^ 0x5c).collect();
        let value = hasher.digest(b"value");

        // Recompute each stratum from the bottom, feeding every subtree root
        // into its parent's leaf slot.
        let mut current = value;
        for prefix_len in (0..32).rev() {
            let mut record = SubtreeRecord::new(key[..prefix_len].to_vec());
            record.set(&Suffix::leaf(key[prefix_len]), current);
            populate_map_subtree(&map_hasher, &mut record).expect("populate");
            current = record.root_hash.expect("root");
        }

        let id = crate::NodeId::from_hash(&key);
        let mut expected = value;
        for height in 0..256 {
            let sibling = map_hasher.empty_at_height(height).expect("in range");
            expected = if id.bit(255 - height) {
                hasher.combine(sibling, &expected)
            } else {
                hasher.combine(&expected, sibling)
            };
        }
        assert_eq!(current, expected);
    }

    #[test]
    fn test_rejects_internal_suffix_in_leaves() {
        let map_hasher = MapHasher::new(Rfc6962Hasher);
        let mut record = SubtreeRecord::new(Vec::new());
        record
            .leaves
            .insert(Suffix::for_position(4, 3).expect("valid").serialize(), [1; 32]);
        assert_matches!(
            populate_map_subtree(&map_hasher, &mut record),
            Err(Error::CorruptedData(_))
        );

        let mut record = SubtreeRecord::new(Vec::new());
        record.leaves.insert("???".to_string(), [1; 32]);
        assert_matches!(
            populate_map_subtree(&map_hasher, &mut record),
            Err(Error::CorruptedData(_))
        );
    }

    #[test]
    fn test_rejects_prefix_below_map_depth() {
        let map_hasher = MapHasher::with_depth(Rfc6962Hasher, 16);
        let mut record = SubtreeRecord::new(vec![1, 2]);
        assert_matches!(
            populate_map_subtree(&map_hasher, &mut record),
            Err(Error::CorruptedData(_))
        );
        assert_eq!(record.root_hash, None);
    }
}
