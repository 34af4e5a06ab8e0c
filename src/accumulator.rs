use crate::merge::MaterializedPoint;

/// The downstream collaborator that materialized points are handed to.
/// Encoding and shipping EMF is out of scope for this crate (§1); this
/// trait is the seam the pipeline ends at.
pub trait Accumulator: Send + Sync {
    fn add_fields(&self, measurement: &str, point: &MaterializedPoint);
}

/// A development/test accumulator that logs each call instead of shipping
/// anywhere. Not a production sink: no batching, no retries, no network.
#[derive(Default)]
pub struct StdoutAccumulator;

impl Accumulator for StdoutAccumulator {
    fn add_fields(&self, measurement: &str, point: &MaterializedPoint) {
        debug!(
            "{measurement} labels={:?} fields={:?} ts={}",
            point.labels, point.fields, point.timestamp_ms
        );
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use parking_lot::Mutex;

    /// Records every call for assertions in handler tests.
    #[derive(Default)]
    pub struct RecordingAccumulator {
        pub calls: Mutex<Vec<MaterializedPoint>>,
    }

    impl Accumulator for RecordingAccumulator {
        fn add_fields(&self, _measurement: &str, point: &MaterializedPoint) {
            self.calls.lock().push(point.clone());
        }
    }
}
