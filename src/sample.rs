use std::collections::BTreeMap;

/// Authoritative Prometheus type for a sample, as reconstructed by the
/// resolver. `Unknown` is the state before resolution runs and also the
/// terminal state for a sample whose type could never be determined.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum MetricType {
    Gauge,
    Counter,
    Histogram,
    Summary,
    #[default]
    Unknown,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
            MetricType::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "gauge" => MetricType::Gauge,
            "counter" => MetricType::Counter,
            "histogram" => MetricType::Histogram,
            "summary" => MetricType::Summary,
            _ => MetricType::Unknown,
        }
    }
}

/// A single metric observation as it flows through the pipeline.
///
/// `name`/`job`/`instance` hold the possibly-relabeled values; the
/// `pre_relabel_*` fields preserve the values captured by the scrape
/// layer's magic labels before any user relabeling ran.
#[derive(Clone, Debug)]
pub struct Sample {
    pub name: String,
    pub pre_relabel_name: String,
    pub pre_relabel_job: String,
    pub pre_relabel_instance: String,
    pub value: f64,
    pub timestamp_ms: i64,
    pub metric_type: MetricType,
    pub labels: BTreeMap<String, String>,
}

impl Sample {
    pub fn new(
        name: impl Into<String>,
        timestamp_ms: i64,
        value: f64,
        labels: BTreeMap<String, String>,
    ) -> Self {
        let name = name.into();
        Self {
            pre_relabel_name: name.clone(),
            name,
            pre_relabel_job: String::new(),
            pre_relabel_instance: String::new(),
            value,
            timestamp_ms,
            metric_type: MetricType::Unknown,
            labels,
        }
    }

    pub fn with_pre_relabel(
        mut self,
        name: impl Into<String>,
        job: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        self.pre_relabel_name = name.into();
        self.pre_relabel_job = job.into();
        self.pre_relabel_instance = instance.into();
        self
    }

    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(|s| s.as_str())
    }

    pub fn is_internal(&self) -> bool {
        self.name == "up" || self.name.starts_with("scrape_")
    }

    /// True if the value is the reserved stale marker, plain NaN, or
    /// infinite. All three are treated identically by the delta calculator.
    pub fn is_invalid_value(&self) -> bool {
        self.value.is_nan() || self.value.is_infinite()
    }
}

/// The reserved NaN bit pattern Prometheus uses to mark a series absent.
/// `f64::NAN` from a different source is indistinguishable in IEEE-754
/// terms but the pipeline does not need to tell them apart: both are
/// invalid values per §4.4.
pub const STALE_NAN_BITS: u64 = 0x7ff0000000000002;

pub fn stale_nan() -> f64 {
    f64::from_bits(STALE_NAN_BITS)
}

/// An ordered sequence of samples that came from one scrape target.
///
/// All samples in a batch share the same pre-relabel job and instance; the
/// batch is committed once to the queue and is immutable afterward.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    samples: Vec<Sample>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn into_iter(self) -> impl Iterator<Item = Sample> {
        self.samples.into_iter()
    }

    /// The `(job, instance)` pair from the first sample that has both
    /// pre-relabel values set, per the resolver's target-selection rule.
    pub fn target_info(&self) -> Option<(&str, &str)> {
        self.samples.iter().find_map(|s| {
            if !s.pre_relabel_job.is_empty() && !s.pre_relabel_instance.is_empty() {
                Some((s.pre_relabel_job.as_str(), s.pre_relabel_instance.as_str()))
            } else {
                None
            }
        })
    }
}

impl FromIterator<Sample> for Batch {
    fn from_iter<T: IntoIterator<Item = Sample>>(iter: T) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Sample>> for Batch {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}
