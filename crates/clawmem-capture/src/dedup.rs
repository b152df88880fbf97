//! [`RecencyDedupCache`] – bounded set of recently captured fingerprints.
//!
//! # Algorithm
//!
//! The cache keeps fingerprints in insertion order next to a hash set for
//! O(1) membership.  After each [`RecencyDedupCache::record`] call that pushes
//! the size past `capacity`, the oldest fingerprint is evicted.  Eviction is
//! FIFO: recording a fingerprint that is already present does not move it.
//!
//! The cache is process-local and never persisted; a restart forgets all
//! history.  It is shared across sessions through [`SharedDedupCache`], whose
//! mutex makes evict-then-insert atomic with respect to the size check.
//!
//! # Example
//!
//! ```rust
//! use clawmem_capture::dedup::RecencyDedupCache;
//! use clawmem_capture::normalizer::normalize;
//!
//! let mut cache = RecencyDedupCache::new(2);
//! cache.record(normalize("first capture"));
//! cache.record(normalize("second capture"));
//! cache.record(normalize("third capture")); // evicts "first capture"
//!
//! assert!(!cache.contains(&normalize("first capture")));
//! assert!(cache.contains(&normalize("third capture")));
//! assert_eq!(cache.len(), 2);
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::normalizer::Fingerprint;

/// Capacity used when none is configured.
pub const DEFAULT_DEDUP_CAPACITY: usize = 200;

// ─────────────────────────────────────────────────────────────────────────────
// RecencyDedupCache
// ─────────────────────────────────────────────────────────────────────────────

/// Insertion-ordered, capacity-bounded fingerprint set.
#[derive(Debug, Clone)]
pub struct RecencyDedupCache {
    /// Maximum number of fingerprints retained.
    capacity: usize,
    /// Fingerprints, oldest first.
    order: VecDeque<Fingerprint>,
    members: HashSet<Fingerprint>,
}

impl RecencyDedupCache {
    /// Create an empty cache.  A `capacity` of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.members.contains(fingerprint)
    }

    /// Record a captured fingerprint, evicting the oldest entry when the
    /// cache grows past its capacity.
    pub fn record(&mut self, fingerprint: Fingerprint) {
        if !self.members.insert(fingerprint.clone()) {
            return;
        }
        self.order.push_back(fingerprint);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every recorded fingerprint.
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

impl Default for RecencyDedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SharedDedupCache
// ─────────────────────────────────────────────────────────────────────────────

/// Cloneable handle to a cache shared between sessions.
#[derive(Debug, Clone, Default)]
pub struct SharedDedupCache {
    inner: Arc<Mutex<RecencyDedupCache>>,
}

impl SharedDedupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecencyDedupCache::new(capacity))),
        }
    }

    /// Lock the cache.  A poisoned lock is recovered: the cache holds no
    /// invariant a panicking holder could have broken half-way.
    pub fn lock(&self) -> MutexGuard<'_, RecencyDedupCache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().contains(fingerprint)
    }

    pub fn record(&self, fingerprint: Fingerprint) {
        self.lock().record(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
