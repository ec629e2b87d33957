//! Backing storage for subtree records.

use crate::{NodeId, Result, SubtreeRecord};

/// Persistent storage for subtree records, keyed by subtree prefix.
///
/// [`SubtreeCache`](crate::SubtreeCache) takes its fetch and persist
/// callbacks per call; [`get_subtree`](Self::get_subtree) and
/// [`set_subtrees`](Self::set_subtrees) plug directly into them.
pub trait SubtreeStore {
    /// Load the record for the subtree rooted at `id`, or `None` if the
    /// subtree has never been written.
    fn get_subtree(&self, id: &NodeId) -> Result<Option<SubtreeRecord>>;

    /// Persist a batch of records in a single write.
    fn set_subtrees(&self, records: &[&SubtreeRecord]) -> Result<()>;
}

impl<S: SubtreeStore + ?Sized> SubtreeStore for &S {
    fn get_subtree(&self, id: &NodeId) -> Result<Option<SubtreeRecord>> {
        (**self).get_subtree(id)
    }

    fn set_subtrees(&self, records: &[&SubtreeRecord]) -> Result<()> {
        (**self).set_subtrees(records)
    }
}

#[cfg(any(test, feature = "mem_store"))]
pub use mem::MemSubtreeStore;

#[cfg(any(test, feature = "mem_store"))]
mod mem {
    use std::{
        cell::{Cell, RefCell},
        collections::BTreeMap,
    };

    use super::SubtreeStore;
    use crate::{Error, NodeId, Result, SubtreeRecord};

    /// In-memory subtree store backed by a `BTreeMap` of encoded records.
    ///
    /// Records go through the same bincode encoding a persistent backend
    /// would use. Reads and write batches are counted so tests can check
    /// how often the cache reaches storage.
    #[derive(Debug, Default)]
    pub struct MemSubtreeStore {
        records: RefCell<BTreeMap<Vec<u8>, Vec<u8>>>,
        gets: Cell<usize>,
        set_batches: Cell<usize>,
    }

    impl MemSubtreeStore {
        /// Create an empty store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Store `record` directly, bypassing the write counters.
        pub fn insert(&self, record: &SubtreeRecord) -> Result<()> {
            let bytes = record.encode_to_vec()?;
            self.records.borrow_mut().insert(record.prefix.clone(), bytes);
            Ok(())
        }

        /// Decoded record stored under `prefix`, if any.
        pub fn record(&self, prefix: &[u8]) -> Result<Option<SubtreeRecord>> {
            self.records
                .borrow()
                .get(prefix)
                .map(|bytes| SubtreeRecord::decode_from_slice(bytes))
                .transpose()
        }

        /// Number of stored subtrees.
        pub fn len(&self) -> usize {
            self.records.borrow().len()
        }

        /// Returns `true` if no subtree has been stored.
        pub fn is_empty(&self) -> bool {
            self.records.borrow().is_empty()
        }

        /// Number of [`get_subtree`](SubtreeStore::get_subtree) calls so far.
        pub fn get_count(&self) -> usize {
            self.gets.get()
        }

        /// Number of [`set_subtrees`](SubtreeStore::set_subtrees) calls so
        /// far.
        pub fn set_batch_count(&self) -> usize {
            self.set_batches.get()
        }
    }

    impl SubtreeStore for MemSubtreeStore {
        fn get_subtree(&self, id: &NodeId) -> Result<Option<SubtreeRecord>> {
            self.gets.set(self.gets.get() + 1);
            if id.depth_bits() % 8 != 0 {
                return Err(Error::InvalidInput(format!(
                    "subtree id {} is not byte aligned",
                    id
                )));
            }
            self.record(&id.path()[..id.depth_bits() / 8])
        }

        fn set_subtrees(&self, records: &[&SubtreeRecord]) -> Result<()> {
            self.set_batches.set(self.set_batches.get() + 1);
            // a failed encode leaves the store untouched
            let encoded = records
                .iter()
                .map(|record| Ok((record.prefix.clone(), record.encode_to_vec()?)))
                .collect::<Result<Vec<_>>>()?;
            self.records.borrow_mut().extend(encoded);
            Ok(())
        }
    }
}
