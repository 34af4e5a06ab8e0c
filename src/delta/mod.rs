mod ttl_map;

use std::time::{Duration, Instant};

use crate::fingerprint;
use crate::metrics;
use crate::sample::{MetricType, Sample};

pub use ttl_map::TtlMap;

/// How long a series' last observation is retained with no updates before
/// it is evicted by the sweep.
pub const STATE_TTL: Duration = Duration::from_secs(5 * 60);

/// Minimum wall-clock time between sweeps of the state map.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug)]
struct DeltaState {
    last_value: f64,
    last_timestamp_ms: i64,
}

/// Converts cumulative counter and summary count/sum series to
/// per-interval deltas; gauges and summary quantile points pass through
/// unchanged.
///
/// Owns its state map exclusively: per §5 this type is only ever driven by
/// the single handler task, so no internal synchronization is needed.
pub struct DeltaCalculator {
    state: TtlMap<String, DeltaState>,
    last_sweep: Instant,
}

impl Default for DeltaCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaCalculator {
    pub fn new() -> Self {
        Self {
            state: TtlMap::new(STATE_TTL),
            last_sweep: Instant::now(),
        }
    }

    /// Applies the delta transform to one sample, returning `None` if it
    /// should be dropped. Mutates the sample's value in place to the
    /// computed delta when one is emitted. Also runs the periodic sweep if
    /// due (§4.4's "at most once per 60s").
    pub fn apply(&mut self, mut sample: Sample) -> Option<Sample> {
        let result = if !needs_delta(&sample) {
            Some(sample)
        } else {
            let key = fingerprint::with_name(&sample);

            if sample.is_invalid_value() {
                self.state.remove(&key);
                metrics::SAMPLES_DROPPED_INVALID_VALUE.increment();
                None
            } else {
                let emitted = match self.state.get(&key) {
                    Some(prior) if sample.timestamp_ms > prior.last_timestamp_ms => {
                        if sample.value >= prior.last_value {
                            Some(sample.value - prior.last_value)
                        } else {
                            // Counter reset: the source emits the raw value
                            // verbatim rather than zero. See DESIGN.md.
                            metrics::DELTA_RESETS.increment();
                            Some(sample.value)
                        }
                    }
                    _ => None,
                };

                self.state.insert(
                    key,
                    DeltaState {
                        last_value: sample.value,
                        last_timestamp_ms: sample.timestamp_ms,
                    },
                );

                emitted.map(|delta| {
                    sample.value = delta;
                    sample
                })
            }
        };

        metrics::DELTA_TRACKED.set(self.state.len() as i64);
        self.maybe_sweep();

        result
    }

    fn maybe_sweep(&mut self) {
        if self.last_sweep.elapsed() < SWEEP_INTERVAL {
            return;
        }
        let removed = self.state.sweep();
        if removed > 0 {
            metrics::DELTA_EVICTIONS.add(removed as u64);
        }
        self.last_sweep = Instant::now();
        metrics::DELTA_TRACKED.set(self.state.len() as i64);
    }
}

fn needs_delta(sample: &Sample) -> bool {
    match sample.metric_type {
        MetricType::Counter => true,
        MetricType::Summary => sample.name.ends_with("_count") || sample.name.ends_with("_sum"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::stale_nan;
    use std::collections::BTreeMap;

    fn counter(value: f64, timestamp_ms: i64) -> Sample {
        let mut s = Sample::new("requests", timestamp_ms, value, BTreeMap::new());
        s.metric_type = MetricType::Counter;
        s
    }

    #[test]
    fn s4_delta_across_reset() {
        let mut calc = DeltaCalculator::new();

        assert!(calc.apply(counter(10.0, 1)).is_none());
        assert_eq!(calc.apply(counter(30.0, 2)).unwrap().value, 20.0);
        assert_eq!(calc.apply(counter(5.0, 3)).unwrap().value, 5.0);
    }

    #[test]
    fn s5_invalid_value_resets_baseline() {
        let mut calc = DeltaCalculator::new();

        assert!(calc.apply(counter(10.0, 1)).is_none());
        assert!(calc.apply(counter(stale_nan(), 2)).is_none());
        assert!(calc.apply(counter(100.0, 3)).is_none());
        assert_eq!(calc.apply(counter(120.0, 4)).unwrap().value, 20.0);
    }

    #[test]
    fn repeated_value_never_emits_negative() {
        let mut calc = DeltaCalculator::new();

        assert!(calc.apply(counter(42.0, 1)).is_none());
        assert_eq!(calc.apply(counter(42.0, 2)).unwrap().value, 0.0);
        assert_eq!(calc.apply(counter(42.0, 3)).unwrap().value, 0.0);
    }

    #[test]
    fn gauge_passes_through_unchanged() {
        let mut calc = DeltaCalculator::new();
        let mut s = Sample::new("temp", 1, 98.6, BTreeMap::new());
        s.metric_type = MetricType::Gauge;
        let out = calc.apply(s).unwrap();
        assert_eq!(out.value, 98.6);
    }

    #[test]
    fn summary_quantile_point_passes_through_unchanged() {
        let mut calc = DeltaCalculator::new();
        let mut s = Sample::new("latency", 1, 0.5, BTreeMap::new());
        s.metric_type = MetricType::Summary;
        let out = calc.apply(s).unwrap();
        assert_eq!(out.value, 0.5);
    }

    #[test]
    fn summary_sum_uses_delta_semantics() {
        let mut calc = DeltaCalculator::new();
        let mut first = Sample::new("latency_sum", 1, 10.0, BTreeMap::new());
        first.metric_type = MetricType::Summary;
        let mut second = Sample::new("latency_sum", 2, 15.0, BTreeMap::new());
        second.metric_type = MetricType::Summary;

        assert!(calc.apply(first).is_none());
        assert_eq!(calc.apply(second).unwrap().value, 5.0);
    }

    #[test]
    fn non_monotonic_timestamp_drops_sample() {
        let mut calc = DeltaCalculator::new();
        assert!(calc.apply(counter(10.0, 5)).is_none());
        // A sample arriving with a timestamp that does not exceed the
        // stored one looks like a fresh baseline and is dropped.
        assert!(calc.apply(counter(20.0, 5)).is_none());
    }
}
