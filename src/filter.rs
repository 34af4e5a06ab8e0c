use std::collections::HashSet;

use parking_lot::RwLock;

use crate::metrics;
use crate::sample::{Batch, MetricType};

/// Maximum number of distinct dropped metric names retained for
/// diagnostics. Once reached, further drops are counted but not recorded,
/// bounding the filter's memory use under sustained churn.
pub const MAX_DROPPED_NAMES: usize = 1000;

/// Keeps only Gauge, Counter, and Summary samples. Histogram and typeless
/// samples are dropped, except internal metrics (`up`, `scrape_*`), which
/// pass through regardless of type.
pub struct Filter {
    dropped_names: RwLock<HashSet<String>>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    pub fn new() -> Self {
        Self {
            dropped_names: RwLock::new(HashSet::new()),
        }
    }

    pub fn apply(&self, batch: Batch) -> Batch {
        batch
            .into_iter()
            .filter(|sample| {
                let keep = sample.is_internal()
                    || matches!(
                        sample.metric_type,
                        MetricType::Gauge | MetricType::Counter | MetricType::Summary
                    );

                if !keep {
                    self.record_drop(&sample.name);
                    metrics::SAMPLES_DROPPED_FILTERED.increment();
                }

                keep
            })
            .collect()
    }

    fn record_drop(&self, name: &str) {
        let dropped = self.dropped_names.read();
        if dropped.contains(name) || dropped.len() >= MAX_DROPPED_NAMES {
            return;
        }
        drop(dropped);

        let mut dropped = self.dropped_names.write();
        if dropped.len() < MAX_DROPPED_NAMES {
            dropped.insert(name.to_string());
        }
    }

    /// The first (up to `MAX_DROPPED_NAMES`) distinct metric names dropped
    /// by this filter since construction.
    pub fn dropped_names(&self) -> Vec<String> {
        self.dropped_names.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use std::collections::BTreeMap;

    fn sample(name: &str, metric_type: MetricType) -> crate::sample::Sample {
        let mut s = Sample::new(name, 1, 1.0, BTreeMap::new());
        s.metric_type = metric_type;
        s
    }

    #[test]
    fn drops_histogram_and_unknown() {
        let filter = Filter::new();
        let mut batch = Batch::new();
        batch.push(sample("h", MetricType::Histogram));
        batch.push(sample("u", MetricType::Unknown));
        batch.push(sample("g", MetricType::Gauge));

        let out = filter.apply(batch);
        assert_eq!(out.len(), 1);
        assert_eq!(out.iter().next().unwrap().name, "g");
    }

    #[test]
    fn keeps_internal_metrics_regardless_of_type() {
        let filter = Filter::new();
        let mut batch = Batch::new();
        batch.push(sample("up", MetricType::Unknown));
        batch.push(sample("scrape_samples_scraped", MetricType::Unknown));

        let out = filter.apply(batch);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn bounds_dropped_name_log() {
        let filter = Filter::new();
        for i in 0..(MAX_DROPPED_NAMES + 10) {
            let mut batch = Batch::new();
            batch.push(sample(&format!("dropped_{i}"), MetricType::Histogram));
            filter.apply(batch);
        }
        assert_eq!(filter.dropped_names().len(), MAX_DROPPED_NAMES);
    }

    #[test]
    fn all_untyped_non_internal_batch_emits_nothing() {
        let filter = Filter::new();
        let mut batch = Batch::new();
        batch.push(sample("mystery", MetricType::Unknown));
        let out = filter.apply(batch);
        assert!(out.is_empty());
    }
}
