//! Mapping full-tree coordinates onto subtree coordinates.

use crate::{NodeId, Suffix};

/// Number of tree levels stored in one subtree.
///
/// A multiple of 8 so that subtree prefixes are whole bytes; a [`Suffix`]
/// holds its path in a single byte, which fixes the value at 8.
pub const STRATA_DEPTH: usize = 8;

/// Split a node id into the prefix of the subtree holding it and the
/// node's position inside that subtree.
///
/// The prefix covers `floor((depth - 1) / STRATA_DEPTH) * STRATA_DEPTH`
/// bits, so a node whose depth is an exact positive multiple of
/// `STRATA_DEPTH` is a leaf (`bits == STRATA_DEPTH`) of the shallower
/// subtree rather than the root of a deeper one. Only the global root
/// (depth 0) yields `bits == 0`.
pub fn split_node_id(id: &NodeId) -> (Vec<u8>, Suffix) {
    let depth = id.depth_bits();
    let prefix_bits = depth.saturating_sub(1) / STRATA_DEPTH * STRATA_DEPTH;
    let suffix_bits = depth - prefix_bits;
    let prefix_len = prefix_bits / 8;

    let path = id.path();
    let value = if suffix_bits > 0 { path[prefix_len] } else { 0 };
    (
        path[..prefix_len].to_vec(),
        Suffix::masked(suffix_bits as u8, value),
    )
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// `(path, depth_bits, prefix, suffix_bits, suffix_value)`
    #[allow(clippy::type_complexity)]
    const SPLIT_VECTORS: &[(&[u8], usize, &[u8], u8, u8)] = &[
        (&[0x12, 0x34, 0x56, 0x7f], 32, &[0x12, 0x34, 0x56], 8, 0x7f),
        (&[0x12, 0x34, 0x56, 0xff], 29, &[0x12, 0x34, 0x56], 5, 0xf8),
        (&[0x12, 0x34, 0x56, 0xff], 25, &[0x12, 0x34, 0x56], 1, 0x80),
        (&[0x12, 0x34, 0x56, 0x78], 16, &[0x12], 8, 0x34),
        (&[0x12, 0x34, 0x56, 0x78], 9, &[0x12], 1, 0x00),
        (&[0x12, 0x34, 0x56, 0x78], 8, &[], 8, 0x12),
        (&[0x12, 0x34, 0x56, 0x78], 7, &[], 7, 0x12),
        (&[0x12, 0x34, 0x56, 0x78], 0, &[], 0, 0x00),
        (&[0x70], 2, &[], 2, 0x40),
        (&[0x70], 3, &[], 3, 0x60),
        (&[0x70], 4, &[], 4, 0x70),
        (&[0x70], 5, &[], 5, 0x70),
        (&[0x00, 0x03], 16, &[0x00], 8, 0x03),
        (&[0x00, 0x03], 15, &[0x00], 7, 0x02),
    ];

    #[test]
    fn test_split_node_id_vectors() {
        for (i, &(path, depth_bits, want_prefix, want_bits, want_value)) in
            SPLIT_VECTORS.iter().enumerate()
        {
            let id = NodeId::new(path.to_vec(), depth_bits).expect("valid node id");
            let (prefix, suffix) = split_node_id(&id);
            assert_eq!(prefix, want_prefix, "vector {}: prefix", i);
            assert_eq!(suffix.bits(), want_bits, "vector {}: suffix bits", i);
            assert_eq!(suffix.value(), want_value, "vector {}: suffix value", i);
        }
    }

    #[test]
    fn test_stratum_boundaries_are_leaves() {
        let path = vec![0xa5; 32];
        for depth in (STRATA_DEPTH..=256).step_by(STRATA_DEPTH) {
            let id = NodeId::new(path.clone(), depth).expect("valid");
            let (prefix, suffix) = split_node_id(&id);
            assert_eq!(suffix.bits() as usize, STRATA_DEPTH, "depth {}", depth);
            assert_eq!(prefix.len() * 8, depth - STRATA_DEPTH);
        }
        let (prefix, suffix) = split_node_id(&NodeId::new(path, 0).expect("valid"));
        assert!(prefix.is_empty());
        assert_eq!(suffix.bits(), 0);
    }

    fn node_id_strategy() -> impl Strategy<Value = NodeId> {
        prop::collection::vec(any::<u8>(), 0..40).prop_flat_map(|path| {
            let max = path.len() * 8;
            (Just(path), 0..=max).prop_map(|(path, depth)| {
                NodeId::new(path, depth).expect("depth within path")
            })
        })
    }

    proptest! {
        #[test]
        fn test_split_covers_depth(id in node_id_strategy()) {
            let (prefix, suffix) = split_node_id(&id);
            prop_assert_eq!(prefix.len() * 8 + suffix.bits() as usize, id.depth_bits());
            prop_assert_eq!(prefix.len() * 8 % STRATA_DEPTH, 0);
            prop_assert_eq!(suffix.bits() == 0, id.depth_bits() == 0);
        }

        #[test]
        fn test_split_prefix_addresses_containing_subtree(id in node_id_strategy()) {
            let (prefix, suffix) = split_node_id(&id);
            let subtree = NodeId::for_subtree_prefix(&prefix);
            prop_assert_eq!(subtree.depth_bits(), prefix.len() * 8);
            prop_assert_eq!(&id.path()[..prefix.len()], subtree.path());

            // Re-deriving the node from the subtree and suffix gives back
            // the same coordinate.
            let mut path = prefix.clone();
            path.push(suffix.value());
            let rebuilt = NodeId::new(path, id.depth_bits()).expect("valid");
            prop_assert_eq!(&rebuilt, &id);
            prop_assert_eq!(split_node_id(&rebuilt), (prefix, suffix));
        }
    }
}
