//! Read-through, write-back cache of subtree records.

use indexmap::{IndexMap, map::Entry};
use strata_merkle::{Hash, TreeHasher};
use tracing::{debug, warn};

use crate::{
    Error, NodeId, Result, SubtreeRecord, populate::SubtreePopulator, split_node_id,
};

#[derive(Debug)]
struct CacheEntry {
    record: SubtreeRecord,
    dirty: bool,
}

/// Caches subtree records keyed by prefix for the lifetime of one batch of
/// tree operations.
///
/// Each subtree is fetched from storage at most once: the first
/// [`get_node_hash`](Self::get_node_hash) or
/// [`set_node_hash`](Self::set_node_hash) touching it calls `fetch`, and every
/// later access is served from memory. Writes mark the subtree dirty;
/// [`flush`](Self::flush) rebuilds every dirty subtree and hands the whole
/// batch to storage in one call.
///
/// The cache is not thread safe. Use one cache per logical writer.
#[derive(Debug)]
pub struct SubtreeCache<H> {
    entries: IndexMap<Vec<u8>, CacheEntry>,
    populator: SubtreePopulator<H>,
}

impl<H: TreeHasher> SubtreeCache<H> {
    /// Create a cache that rebuilds dirty subtrees with `populator`.
    pub fn new(populator: SubtreePopulator<H>) -> Self {
        Self {
            entries: IndexMap::new(),
            populator,
        }
    }

    /// Cache for a sparse map hashed with `hasher`.
    pub fn map(hasher: H) -> Self {
        Self::new(SubtreePopulator::map(hasher))
    }

    /// Cache for an append-only log hashed with `hasher`.
    pub fn log(hasher: H) -> Self {
        Self::new(SubtreePopulator::log(hasher))
    }

    /// Number of cached subtrees.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no subtree has been loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of subtrees modified since the last successful flush.
    pub fn dirty_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.dirty).count()
    }

    /// Returns `true` if the subtree at `prefix` is cached and modified.
    pub fn is_dirty(&self, prefix: &[u8]) -> bool {
        self.entries.get(prefix).is_some_and(|entry| entry.dirty)
    }

    /// Cached record for the subtree at `prefix`, if loaded.
    pub fn record(&self, prefix: &[u8]) -> Option<&SubtreeRecord> {
        self.entries.get(prefix).map(|entry| &entry.record)
    }

    /// Hash of the node at `id`.
    ///
    /// Loads the containing subtree through `fetch` if it is not cached yet.
    /// Returns [`Error::HashNotFound`] if the subtree holds nothing at that
    /// position. Reads see hashes set earlier through this cache.
    pub fn get_node_hash<F>(&mut self, id: &NodeId, fetch: F) -> Result<Hash>
    where
        F: FnOnce(&NodeId) -> Result<Option<SubtreeRecord>>,
    {
        let (prefix, suffix) = split_node_id(id);
        let entry = self.load(prefix, fetch)?;
        entry
            .record
            .get(&suffix)
            .copied()
            .ok_or_else(|| Error::HashNotFound {
                prefix: entry.record.prefix.clone(),
                suffix,
            })
    }

    /// Set the hash of the node at `id` and mark its subtree dirty.
    ///
    /// Loads the containing subtree through `fetch` first if it is not
    /// cached, so a flush never overwrites stored leaves it did not see.
    pub fn set_node_hash<F>(&mut self, id: &NodeId, hash: Hash, fetch: F) -> Result<()>
    where
        F: FnOnce(&NodeId) -> Result<Option<SubtreeRecord>>,
    {
        let (prefix, suffix) = split_node_id(id);
        let entry = self.load(prefix, fetch)?;
        entry.record.set(&suffix, hash);
        entry.dirty = true;
        Ok(())
    }

    /// Rebuild every dirty subtree and persist them with a single call to
    /// `set`, in the order the subtrees were first loaded.
    ///
    /// Does nothing, and does not call `set`, if no subtree is dirty. If
    /// rebuilding or `set` fails the error is returned and every subtree
    /// stays dirty, so the flush can be retried.
    pub fn flush<F>(&mut self, set: F) -> Result<()>
    where
        F: FnOnce(&[&SubtreeRecord]) -> Result<()>,
    {
        for entry in self.entries.values_mut().filter(|entry| entry.dirty) {
            if let Err(e) = self.populator.repopulate(&mut entry.record) {
                warn!(
                    prefix = %hex::encode(&entry.record.prefix),
                    error = %e,
                    "failed to rebuild subtree"
                );
                return Err(e);
            }
        }

        let batch: Vec<&SubtreeRecord> = self
            .entries
            .values()
            .filter(|entry| entry.dirty)
            .map(|entry| &entry.record)
            .collect();
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        if let Err(e) = set(&batch) {
            warn!(subtrees = count, error = %e, "failed to persist subtrees");
            return Err(e);
        }
        for entry in self.entries.values_mut() {
            entry.dirty = false;
        }
        debug!(subtrees = count, "flushed subtrees");
        Ok(())
    }

    /// Return the cached entry for `prefix`, fetching it on first use.
    ///
    /// A failed fetch caches nothing, so the next access retries it.
    fn load<F>(&mut self, prefix: Vec<u8>, fetch: F) -> Result<&mut CacheEntry>
    where
        F: FnOnce(&NodeId) -> Result<Option<SubtreeRecord>>,
    {
        match self.entries.entry(prefix) {
            Entry::Occupied(occupied) => Ok(occupied.into_mut()),
            Entry::Vacant(vacant) => {
                let id = NodeId::for_subtree_prefix(vacant.key());
                let record = match fetch(&id)? {
                    Some(record) if record.prefix != *vacant.key() => {
                        return Err(Error::CorruptedData(format!(
                            "fetched subtree {} for prefix {}",
                            hex::encode(&record.prefix),
                            hex::encode(vacant.key())
                        )));
                    }
                    Some(record) => {
                        debug!(
                            prefix = %hex::encode(vacant.key()),
                            leaves = record.leaf_count(),
                            "loaded subtree"
                        );
                        record
                    }
                    None => {
                        debug!(prefix = %hex::encode(vacant.key()), "new subtree");
                        SubtreeRecord::new(vacant.key().clone())
                    }
                };
                Ok(vacant.insert(CacheEntry {
                    record,
                    dirty: false,
                }))
            }
        }
    }
}
