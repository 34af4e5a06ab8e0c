use std::collections::BTreeMap;

use crate::error::IngestError;
use crate::queue::BatchQueue;
use crate::sample::{Batch, Sample};

/// Labels injected by the scrape config's extra relabel rules before any
/// user-supplied relabeling runs. They preserve the pre-relabel identity of
/// a series so the type resolver can look it up later regardless of what
/// the user did to `__name__`, `job`, or `instance`.
pub const NAME_LABEL: &str = "__name__";
pub const SAVED_NAME_LABEL: &str = "saved_scrape_name";
pub const SAVED_JOB_LABEL: &str = "saved_scrape_job";
pub const SAVED_INSTANCE_LABEL: &str = "saved_scrape_instance";

/// A point in time and a value, as handed to `append_exemplar`.
#[derive(Clone, Copy, Debug)]
pub struct Exemplar {
    pub timestamp_ms: i64,
    pub value: f64,
}

/// Series reference returned by append calls. The pipeline does not support
/// caching series references across calls, so this is always zero.
pub type SeriesRef = u64;

/// Assembles raw scrape-loop output into a `Batch` for atomic commit.
///
/// One `Appender` is used per scrape; it is purely a marshaller and does
/// not compute types or enrich samples.
pub struct Appender {
    queue: BatchQueue,
    batch: Batch,
}

impl Appender {
    pub fn new(queue: BatchQueue) -> Self {
        Self {
            queue,
            batch: Batch::new(),
        }
    }

    /// Extracts `__name__` as the metric name, peels off the three saved
    /// labels into the sample's pre-relabel fields, and appends the sample
    /// to the in-progress batch.
    pub fn append(
        &mut self,
        mut labels: BTreeMap<String, String>,
        timestamp_ms: i64,
        value: f64,
    ) -> Result<SeriesRef, IngestError> {
        let name = labels.remove(NAME_LABEL).unwrap_or_default();
        if name.is_empty() {
            return Err(IngestError::MissingName);
        }

        let pre_name = labels.remove(SAVED_NAME_LABEL).unwrap_or_else(|| name.clone());
        let pre_job = labels.remove(SAVED_JOB_LABEL).unwrap_or_default();
        let pre_instance = labels.remove(SAVED_INSTANCE_LABEL).unwrap_or_default();

        let sample = Sample::new(name, timestamp_ms, value, labels)
            .with_pre_relabel(pre_name, pre_job, pre_instance);

        self.batch.push(sample);

        Ok(0)
    }

    /// Equivalent to `append`, using the exemplar's own timestamp and value.
    pub fn append_exemplar(
        &mut self,
        labels: BTreeMap<String, String>,
        exemplar: Exemplar,
    ) -> Result<SeriesRef, IngestError> {
        self.append(labels, exemplar.timestamp_ms, exemplar.value)
    }

    /// Accepted and ignored: histogram bucket data is not represented by
    /// this pipeline's `Sample` type.
    pub fn append_histogram(&mut self) -> Result<SeriesRef, IngestError> {
        Ok(0)
    }

    /// Accepted and ignored: metadata updates don't affect this core, which
    /// derives types from the metadata cache at resolve time instead.
    pub fn update_metadata(&mut self) {}

    /// Hands the accumulated batch to the queue. Non-blocking: if the queue
    /// is at capacity the batch is dropped and a warning is logged.
    pub fn commit(mut self) {
        let batch = std::mem::take(&mut self.batch);
        if batch.is_empty() {
            return;
        }
        self.queue.try_send(batch);
    }

    /// Discards the accumulated batch without committing it.
    pub fn rollback(mut self) {
        self.batch = Batch::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::BatchQueue;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn append_extracts_name_and_saved_labels() {
        let (queue, mut rx) = BatchQueue::new(4);
        let mut appender = Appender::new(queue);

        appender
            .append(
                labels(&[
                    (NAME_LABEL, "m2_changed"),
                    (SAVED_NAME_LABEL, "m2"),
                    (SAVED_JOB_LABEL, "myjob"),
                    (SAVED_INSTANCE_LABEL, "1.2.3.4:9100"),
                    ("extra", "kept"),
                ]),
                1000,
                42.0,
            )
            .unwrap();
        appender.commit();

        let batch = rx.try_recv().expect("batch committed");
        let sample = batch.iter().next().unwrap();
        assert_eq!(sample.name, "m2_changed");
        assert_eq!(sample.pre_relabel_name, "m2");
        assert_eq!(sample.pre_relabel_job, "myjob");
        assert_eq!(sample.pre_relabel_instance, "1.2.3.4:9100");
        assert_eq!(sample.label("extra"), Some("kept"));
        assert!(sample.label(SAVED_NAME_LABEL).is_none());
    }

    #[test]
    fn append_without_name_fails() {
        let (queue, _rx) = BatchQueue::new(4);
        let mut appender = Appender::new(queue);
        let err = appender.append(labels(&[]), 1000, 1.0).unwrap_err();
        assert_eq!(err, IngestError::MissingName);
    }

    #[test]
    fn rollback_discards_batch() {
        let (queue, mut rx) = BatchQueue::new(4);
        let mut appender = Appender::new(queue);
        appender
            .append(labels(&[(NAME_LABEL, "m")]), 1, 1.0)
            .unwrap();
        appender.rollback();
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn commit_of_empty_batch_sends_nothing() {
        let (queue, mut rx) = BatchQueue::new(4);
        let appender = Appender::new(queue);
        appender.commit();
        assert!(rx.try_recv().is_none());
    }
}
