use std::collections::HashSet;

use dashmap::DashMap;

use crate::metrics;

/// Workload metadata attached to an `ip` or `ip:port` key. Immutable once
/// constructed for a given endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodMetadata {
    pub workload: String,
    pub namespace: String,
    pub node: String,
}

/// Concurrent `ip`/`ip:port` → `PodMetadata` index.
///
/// Backed by `DashMap` for lock-free reads and single-writer-per-key
/// semantics (§5): enrichment consumers read through [`AddressIndex::get`]
/// concurrently with the watcher's handlers writing through
/// [`AddressIndex::insert`]/[`AddressIndex::remove`].
#[derive(Default)]
pub struct AddressIndex {
    entries: DashMap<String, PodMetadata>,
}

impl AddressIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<PodMetadata> {
        self.entries.get(key).map(|e| e.clone())
    }

    pub fn insert(&self, key: String, metadata: PodMetadata) {
        self.entries.insert(key, metadata);
        metrics::ADDRESS_INDEX_SIZE.set(self.entries.len() as i64);
    }

    pub fn remove(&self, key: &str) -> Option<PodMetadata> {
        let removed = self.entries.remove(key).map(|(_, v)| v);
        metrics::ADDRESS_INDEX_SIZE.set(self.entries.len() as i64);
        removed
    }

    /// Removes `key` only if its current value still equals `expected`.
    /// Used by the delayed deleter so a key that was concurrently re-bound
    /// to a new pod is not wrongly removed. Returns `true` if the entry
    /// was removed.
    pub fn remove_if_unchanged(&self, key: &str, expected: &PodMetadata) -> bool {
        let removed = self.entries.remove_if(key, |_, v| v == expected).is_some();
        if removed {
            metrics::ADDRESS_INDEX_SIZE.set(self.entries.len() as i64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reverse index from slice UID to the set of keys that slice contributed
/// to the address index. Every key in the address index is reachable from
/// exactly one entry here, so deleting a slice removes precisely the keys
/// it owns without touching keys contributed by other slices.
#[derive(Default)]
pub struct SliceKeys {
    by_uid: DashMap<String, HashSet<String>>,
}

impl SliceKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &str) -> Option<HashSet<String>> {
        self.by_uid.get(uid).map(|e| e.clone())
    }

    pub fn set(&self, uid: String, keys: HashSet<String>) {
        self.by_uid.insert(uid, keys);
    }

    pub fn remove(&self, uid: &str) -> Option<HashSet<String>> {
        self.by_uid.remove(uid).map(|(_, v)| v)
    }
}
