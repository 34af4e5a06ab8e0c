use regex::Regex;
use std::sync::OnceLock;

/// The non-vowel, non-ambiguous alphanumeric alphabet the upstream pod/
/// ReplicaSet name generator draws from (no `0`, `1`, `3` to avoid visual
/// confusion with `o`, `l`, `e`).
const NAME_ALPHABET: &str = "bcdfghjklmnpqrstvwxz2456789";

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)-([0-9]+)$").unwrap())
}

fn pod_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^(.+)-([{NAME_ALPHABET}]{{5}})$")).unwrap()
    })
}

fn hash_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^(.+)-([{NAME_ALPHABET}]{{6,10}})$")).unwrap()
    })
}

/// Infers the top-level workload name for a pod, given an optional
/// fallback (typically the owning EndpointSlice's service-name label).
///
/// See §4.8: StatefulSet pods are `<name>-<ordinal>`; Deployment pods are
/// `<deployment>-<replicaset-hash>-<pod-suffix>`; bare ReplicaSet/DaemonSet
/// pods are `<parent>-<pod-suffix>`. The 47-character deployment-name edge
/// case, where the hash generator truncates into the deployment segment
/// and this heuristic becomes unreliable, falls through to the service
/// name like any other unmatched case.
pub fn infer(pod_name: &str, fallback_service_name: &str) -> String {
    if let Some(caps) = ordinal_re().captures(pod_name) {
        return caps[1].to_string();
    }

    if let Some(caps) = pod_suffix_re().captures(pod_name) {
        let parent = &caps[1];
        if let Some(caps) = hash_suffix_re().captures(parent) {
            return caps[1].to_string();
        }
        return parent.to_string();
    }

    if !fallback_service_name.is_empty() {
        return fallback_service_name.to_string();
    }

    pod_name.to_string()
}
