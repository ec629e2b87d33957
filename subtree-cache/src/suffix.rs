//! Positions inside a subtree and their storage key encoding.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{Error, Result, STRATA_DEPTH};

/// A node position inside one subtree.
///
/// `bits` is the node's depth below the subtree root (`0..=STRATA_DEPTH`)
/// and the top `bits` bits of `value` are its path. Two suffixes are equal
/// only if both fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSuffix"))]
pub struct Suffix {
    bits: u8,
    value: u8,
}

/// Unchecked serde form of [`Suffix`], validated through [`Suffix::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSuffix {
    bits: u8,
    value: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSuffix> for Suffix {
    type Error = Error;

    fn try_from(raw: RawSuffix) -> Result<Self> {
        Self::new(raw.bits, raw.value)
    }
}

/// Mask keeping the top `bits` bits of a byte.
fn mask(bits: u8) -> u8 {
    ((0xFF00u16 >> bits) & 0xFF) as u8
}

impl Suffix {
    /// Create a suffix from its raw fields.
    ///
    /// `value` is stored as given; positions produced by
    /// [`split_node_id`](crate::split_node_id) always have the bits past
    /// `bits` cleared.
    pub fn new(bits: u8, value: u8) -> Result<Self> {
        if bits as usize > STRATA_DEPTH {
            return Err(Error::InvalidInput(format!(
                "suffix of {} bits exceeds strata depth {}",
                bits, STRATA_DEPTH
            )));
        }
        Ok(Self { bits, value })
    }

    /// Suffix with the bits of `value` past `bits` cleared. Caller
    /// guarantees `bits <= STRATA_DEPTH`.
    pub(crate) fn masked(bits: u8, value: u8) -> Self {
        Self {
            bits,
            value: value & mask(bits),
        }
    }

    /// The `index`-th node (left to right) at `depth` levels below the
    /// subtree root.
    pub fn for_position(depth: u8, index: u64) -> Result<Self> {
        if depth as usize > STRATA_DEPTH || index >> depth != 0 {
            return Err(Error::InvalidInput(format!(
                "no node {} at depth {} of a subtree",
                index, depth
            )));
        }
        // index < 2^depth, so the shifted value fits the top `depth` bits
        let value = ((index as u16) << (STRATA_DEPTH as u8 - depth)) as u8;
        Ok(Self { bits: depth, value })
    }

    /// The leaf at `index` (bottom level of the subtree).
    pub fn leaf(index: u8) -> Self {
        Self {
            bits: STRATA_DEPTH as u8,
            value: index,
        }
    }

    /// Depth below the subtree root.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Left-justified path bits.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Left-to-right index of this node within its depth.
    pub fn index(&self) -> u8 {
        ((self.value as u16) >> (STRATA_DEPTH as u8 - self.bits)) as u8
    }

    /// Storage key: standard base64 of the two bytes `[bits, value]`.
    ///
    /// This is the key of the `leaves` and `internal_nodes` maps of a
    /// persisted subtree and must stay stable.
    pub fn serialize(&self) -> String {
        STANDARD.encode([self.bits, self.value])
    }

    /// Parse a key produced by [`serialize`](Self::serialize).
    ///
    /// Rejects keys that do not decode to exactly two bytes and suffixes
    /// deeper than the strata depth.
    pub fn deserialize(key: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(key)
            .map_err(|e| Error::InvalidInput(format!("suffix key {:?}: {}", key, e)))?;
        let [bits, value] = raw[..] else {
            return Err(Error::InvalidInput(format!(
                "suffix key {:?} decodes to {} bytes, expected 2",
                key,
                raw.len()
            )));
        };
        Self::new(bits, value)
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02x}", self.bits, self.value)
    }
}
