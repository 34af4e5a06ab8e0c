use crate::merge::MaterializedPoint;

const CLUSTER_NAME_TAG: &str = "ClusterName";
const SERVICE_NAME_TAG: &str = "ServiceName";
const JOB_TAG: &str = "job";
const DEFAULT_SERVICE_NAME: &str = "default";

/// Attaches the EMF-facing metadata tags every materialized point needs
/// before being handed to the accumulator: a cluster name (unless the
/// point already carries one, e.g. via a per-target relabel override) and
/// a service name substitutable into the downstream log-stream template.
pub fn attach(point: &mut MaterializedPoint, cluster_name: Option<&str>) {
    if let Some(cluster_name) = cluster_name {
        if !point.labels.contains_key(CLUSTER_NAME_TAG) {
            point.labels.insert(CLUSTER_NAME_TAG.to_string(), cluster_name.to_string());
        }
    }

    let service_name = point
        .labels
        .get(JOB_TAG)
        .cloned()
        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());
    point.labels.insert(SERVICE_NAME_TAG.to_string(), service_name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn point(labels: &[(&str, &str)]) -> MaterializedPoint {
        MaterializedPoint {
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            fields: BTreeMap::new(),
            timestamp_ms: 1,
        }
    }

    #[test]
    fn adds_cluster_name_when_configured_and_absent() {
        let mut p = point(&[]);
        attach(&mut p, Some("prod"));
        assert_eq!(p.labels.get(CLUSTER_NAME_TAG).map(String::as_str), Some("prod"));
    }

    #[test]
    fn does_not_override_existing_cluster_name() {
        let mut p = point(&[(CLUSTER_NAME_TAG, "override")]);
        attach(&mut p, Some("prod"));
        assert_eq!(p.labels.get(CLUSTER_NAME_TAG).map(String::as_str), Some("override"));
    }

    #[test]
    fn service_name_falls_back_to_default() {
        let mut p = point(&[]);
        attach(&mut p, None);
        assert_eq!(p.labels.get(SERVICE_NAME_TAG).map(String::as_str), Some(DEFAULT_SERVICE_NAME));
    }

    #[test]
    fn service_name_taken_from_job_tag() {
        let mut p = point(&[(JOB_TAG, "payments")]);
        attach(&mut p, None);
        assert_eq!(p.labels.get(SERVICE_NAME_TAG).map(String::as_str), Some("payments"));
    }
}
