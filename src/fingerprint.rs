use crate::sample::Sample;

/// Canonical series identity: label keys sorted ascending, each rendered as
/// `key=value,`, concatenated. Used both as the label-only grouping key for
/// the merger and, with the name suffix appended, as the delta
/// calculator's per-series key.
///
/// Distinct metric types with identical name and labels are assumed
/// impossible in a well-formed scrape and are not disambiguated here.
pub fn labels_only(sample: &Sample) -> String {
    let mut out = String::new();
    for (k, v) in sample.labels.iter() {
        out.push_str(k);
        out.push('=');
        out.push_str(v);
        out.push(',');
    }
    out
}

/// The full fingerprint: labels plus `metricName=<name>,`.
pub fn with_name(sample: &Sample) -> String {
    let mut out = labels_only(sample);
    out.push_str("metricName=");
    out.push_str(&sample.name);
    out.push(',');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn fingerprint_is_order_independent_in_input_but_sorted_in_output() {
        let mut labels = BTreeMap::new();
        labels.insert("b".to_string(), "2".to_string());
        labels.insert("a".to_string(), "1".to_string());
        let sample = Sample::new("m", 1, 1.0, labels);

        assert_eq!(labels_only(&sample), "a=1,b=2,");
        assert_eq!(with_name(&sample), "a=1,b=2,metricName=m,");
    }
}
