//! Fixed-capacity LRU cache of decoded records.
//!
//! Maps an absolute line number to its parsed record, amortizing repeated
//! JSON decoding of the same lines while scrolling. Records are shared via
//! `Arc` so eviction is observable (and testable) by pointer identity.

use crate::file::Record;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default cache capacity (number of records).
pub const DEFAULT_CAPACITY: usize = 1024;

/// LRU cache for decoded records keyed by absolute line number.
#[derive(Debug)]
pub struct RecordCache {
    cache: LruCache<usize, Arc<Record>>,
}

impl RecordCache {
    /// Create a cache with the given capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Fetch a record, marking it most recently used.
    pub fn get(&mut self, line: usize) -> Option<Arc<Record>> {
        self.cache.get(&line).cloned()
    }

    /// Insert a record, evicting the least-recently-used entry at capacity.
    pub fn put(&mut self, line: usize, record: Arc<Record>) {
        self.cache.put(line, record);
    }

    /// Whether the record for `line` is currently held.
    pub fn contains(&self, line: usize) -> bool {
        self.cache.contains(&line)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
