use std::collections::HashMap;

use crate::sample::MetricType;

/// Per-(job, instance) metadata populated by the scrape layer. Read-only to
/// the core; lookups are by base metric name.
#[derive(Clone, Debug, Default)]
pub struct MetadataCache {
    by_name: HashMap<String, MetricType>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, metric_type: MetricType) {
        self.by_name.insert(name.into(), metric_type);
    }

    /// Looks up the type registered for a base metric name.
    pub fn metadata(&self, name: &str) -> Option<MetricType> {
        self.by_name.get(name).copied()
    }
}

impl FromIterator<(String, MetricType)> for MetadataCache {
    fn from_iter<T: IntoIterator<Item = (String, MetricType)>>(iter: T) -> Self {
        Self {
            by_name: iter.into_iter().collect(),
        }
    }
}

/// Production collaborator: looks up the metadata cache for a given scrape
/// target. The scrape layer that populates this is out of scope for this
/// crate (§1); only the read side is modeled here.
pub trait MetadataService: Send + Sync {
    /// Returns `None` if the target is gone (e.g. the pod terminated
    /// between scrape and processing), which the resolver treats as
    /// `CacheNotReady` and drops the batch silently.
    fn get(&self, job: &str, instance: &str) -> Option<MetadataCache>;
}

/// In-memory `MetadataService` keyed by `(job, instance)`, used by the
/// binary's local wiring and by tests.
#[derive(Clone, Debug, Default)]
pub struct StaticMetadataService {
    targets: HashMap<(String, String), MetadataCache>,
}

impl StaticMetadataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, job: impl Into<String>, instance: impl Into<String>, cache: MetadataCache) {
        self.targets.insert((job.into(), instance.into()), cache);
    }
}

impl MetadataService for StaticMetadataService {
    fn get(&self, job: &str, instance: &str) -> Option<MetadataCache> {
        self.targets.get(&(job.to_string(), instance.to_string())).cloned()
    }
}
