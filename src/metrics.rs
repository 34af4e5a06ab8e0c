//! Self-observability counters for the ingestion pipeline.
//!
//! These are plain `metriken` metrics, not a sink-facing metrics system of
//! their own: they exist so the lossy behavior the pipeline's design
//! tolerates (dropped batches, dropped samples, evicted baselines) is
//! observable to an operator rather than silent.

use metriken::*;

#[metric(name = "ingest_batches_dropped", description = "batches dropped because the queue was at capacity")]
pub static BATCHES_DROPPED: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_batches_committed", description = "batches successfully committed to the queue")]
pub static BATCHES_COMMITTED: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_samples_dropped", description = "batches dropped for lacking pre-relabel job/instance", metadata = { reason = "no_target_info" })]
pub static SAMPLES_DROPPED_NO_TARGET_INFO: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_samples_dropped", description = "batches dropped silently because metadata was unavailable", metadata = { reason = "cache_not_ready" })]
pub static SAMPLES_DROPPED_CACHE_NOT_READY: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_samples_dropped", description = "samples dropped because their type could not be resolved", metadata = { reason = "metadata_miss" })]
pub static SAMPLES_DROPPED_METADATA_MISS: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_samples_dropped", description = "samples dropped by the type filter (histogram/unknown)", metadata = { reason = "filtered" })]
pub static SAMPLES_DROPPED_FILTERED: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_samples_dropped", description = "samples dropped for being stale, NaN, or infinite", metadata = { reason = "invalid_value" })]
pub static SAMPLES_DROPPED_INVALID_VALUE: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_delta_resets", description = "counter resets observed by the delta calculator")]
pub static DELTA_RESETS: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_delta_evictions", description = "delta baselines evicted by the TTL sweep")]
pub static DELTA_EVICTIONS: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_delta_tracked", description = "fingerprints currently tracked by the delta calculator")]
pub static DELTA_TRACKED: LazyGauge = LazyGauge::new(Gauge::default);

#[metric(name = "ingest_k8s_address_index_size", description = "keys currently held in the endpoint address index")]
pub static ADDRESS_INDEX_SIZE: LazyGauge = LazyGauge::new(Gauge::default);

#[metric(name = "ingest_k8s_delayed_deletes", description = "delayed deletes scheduled against the address index", metadata = { outcome = "scheduled" })]
pub static DELAYED_DELETES_SCHEDULED: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_k8s_delayed_deletes", description = "delayed deletes that actually removed a key", metadata = { outcome = "fired" })]
pub static DELAYED_DELETES_FIRED: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "ingest_k8s_delayed_deletes", description = "delayed deletes skipped because the key was re-bound before firing", metadata = { outcome = "superseded" })]
pub static DELAYED_DELETES_SUPERSEDED: LazyCounter = LazyCounter::new(Counter::default);
