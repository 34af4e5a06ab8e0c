use crate::error::IngestError;
use crate::metadata::MetadataService;
use crate::metrics;
use crate::sample::{Batch, MetricType, Sample};

/// Base-name suffixes that a histogram/summary component metric may carry.
/// Checked before the plain `_total` counter suffix (§4.2 step 1).
const SUMMARY_SUFFIXES: &[&str] = &["_count", "_sum", "_bucket"];

/// Counter suffix stripped as the last resort (§4.2 step 3's final branch).
const COUNTER_SUFFIX: &str = "_total";

/// Reconstructs Prometheus type metadata for every sample in a batch,
/// consulting the metadata cache via each sample's pre-relabel identity
/// rather than its (possibly user-rewritten) post-relabel name.
pub struct TypeResolver<'a> {
    metadata: &'a dyn MetadataService,
}

impl<'a> TypeResolver<'a> {
    pub fn new(metadata: &'a dyn MetadataService) -> Self {
        Self { metadata }
    }

    /// Runs the full algorithm in §4.2 over `batch`, returning the filtered,
    /// type-tagged batch.
    pub fn resolve(&self, batch: Batch) -> Result<Batch, IngestError> {
        if batch.is_empty() {
            return Ok(Batch::new());
        }

        let Some((job, instance)) = batch.target_info() else {
            metrics::SAMPLES_DROPPED_NO_TARGET_INFO.increment();
            return Err(IngestError::NoTargetInfo);
        };

        let Some(cache) = self.metadata.get(job, instance) else {
            debug!("no metadata cache for target ({job}, {instance}); dropping batch");
            metrics::SAMPLES_DROPPED_CACHE_NOT_READY.increment();
            return Ok(Batch::new());
        };

        let mut out = Batch::new();

        for mut sample in batch.into_iter() {
            match resolve_type(&sample, &cache) {
                Some(metric_type) => {
                    sample.metric_type = metric_type;
                    sample.set_label("prom_metric_type", metric_type.as_str());
                    out.push(sample);
                }
                None if sample.is_internal() => {
                    // Type stays `Unknown`, but internal metrics are kept.
                    out.push(sample);
                }
                None => {
                    error!("could not resolve metric type for '{}'", sample.name);
                    metrics::SAMPLES_DROPPED_METADATA_MISS.increment();
                }
            }
        }

        Ok(out)
    }
}

fn resolve_type(sample: &Sample, cache: &crate::metadata::MetadataCache) -> Option<MetricType> {
    // Step 1: histogram/summary component suffix on the pre-relabel name.
    for suffix in SUMMARY_SUFFIXES {
        if let Some(trimmed) = sample.pre_relabel_name.strip_suffix(suffix) {
            if trimmed != sample.pre_relabel_name {
                if let Some(t) = cache.metadata(trimmed) {
                    return Some(t);
                }
            }
        }
    }

    // Step 2: the user renamed the metric; look up by the raw pre-relabel
    // name (covers non-summary metrics whose visible name ends in
    // `_count`/`_sum` without being a real summary component).
    if sample.name != sample.pre_relabel_name {
        if let Some(t) = cache.metadata(&sample.pre_relabel_name) {
            return Some(t);
        }
    }

    // Step 3: last resort. Trim the counter suffix if present and look up
    // again; otherwise the pre-relabel name as-is is the final attempt
    // (covers the overwhelming majority of metrics: an ordinary,
    // unrenamed Gauge or Counter with no `_total` suffix).
    let last_resort = sample
        .pre_relabel_name
        .strip_suffix(COUNTER_SUFFIX)
        .unwrap_or(&sample.pre_relabel_name);

    cache.metadata(last_resort)
}
