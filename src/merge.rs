use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::fingerprint;
use crate::sample::{Batch, Sample};

/// One row ready for the downstream sink: one label set, many fields (one
/// per contributing metric name), one timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterializedPoint {
    pub labels: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    pub timestamp_ms: i64,
}

/// Groups samples that share all labels (the fingerprint without the name
/// suffix) into one `MaterializedPoint` per distinct label set, in the
/// order each label set was first seen in the batch.
pub struct Merger;

impl Merger {
    pub fn merge(batch: Batch) -> Vec<MaterializedPoint> {
        let mut groups: IndexMap<String, MaterializedPoint> = IndexMap::new();

        for sample in batch.into_iter() {
            let key = fingerprint::labels_only(&sample);
            let entry = groups.entry(key).or_insert_with(|| MaterializedPoint {
                labels: sample.labels.clone(),
                fields: BTreeMap::new(),
                timestamp_ms: sample.timestamp_ms,
            });
            entry.fields.insert(sample.name.clone(), sample.value);
        }

        groups.into_values().collect()
    }
}
