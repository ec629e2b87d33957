use thiserror::Error;

use crate::Suffix;

/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from subtree cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The storage backend failed to read or persist subtrees.
    #[error("store error: {0}")]
    StoreError(String),
    /// The subtree loaded but holds no hash at the requested position.
    #[error("no hash at suffix {suffix} of subtree {}", hex::encode(.prefix))]
    HashNotFound {
        /// Prefix of the subtree that was searched.
        prefix: Vec<u8>,
        /// Position inside the subtree.
        suffix: Suffix,
    },
    /// A subtree record is malformed or its leaves are inconsistent.
    #[error("corrupted data: {0}")]
    CorruptedData(String),
    /// A node id or suffix was out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Returns `true` for [`Error::HashNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::HashNotFound { .. })
    }
}
