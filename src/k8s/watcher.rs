use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::k8s::address_index::{AddressIndex, PodMetadata, SliceKeys};
use crate::k8s::delayed_delete::DelayedDeleter;
use crate::k8s::workload;

/// One endpoint's target reference, as carried on an `EndpointSlice`
/// object. Only `Pod`-kind targets contribute keys (§4.7).
#[derive(Clone, Debug)]
pub struct EndpointRef {
    pub kind: String,
    pub pod_name: String,
}

/// A single endpoint within a slice: a target reference, its node name,
/// and the addresses it owns. Per-endpoint hostname/zone/hints are
/// stripped by the transform step before this type is ever constructed;
/// node name is kept since `PodMetadata` carries it (§3).
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub target_ref: Option<EndpointRef>,
    pub node_name: Option<String>,
    pub addresses: Vec<String>,
}

/// A minimal, already-transformed view of an `EndpointSlice`: just the
/// fields the watcher consults. Annotations, managed fields, finalizers
/// and other unused fields are stripped by the transform step (§4.7)
/// before an object ever reaches this shape.
#[derive(Clone, Debug)]
pub struct SliceView {
    pub uid: String,
    pub namespace: String,
    pub service_name: String,
    pub endpoints: Vec<Endpoint>,
    pub ports: Vec<u16>,
}

/// Informer-shaped event stream, decoupled from `kube::runtime::watcher`'s
/// exact `Event` type so the reconciliation logic below can be exercised
/// against a synthetic stream in tests and a `kube`-backed adapter in
/// production.
#[derive(Clone, Debug)]
pub enum SliceEvent {
    Applied(SliceView),
    Deleted { uid: String },
}

/// Computes the key set a slice contributes: one `ip` key and one
/// `ip:port` key per declared port, for every endpoint whose workload
/// can be inferred. Endpoints with a non-`Pod` target reference, or
/// with no target reference at all, are discarded (§4.7).
fn key_set(slice: &SliceView) -> Vec<(String, PodMetadata)> {
    let mut out = Vec::new();

    for endpoint in &slice.endpoints {
        let Some(target_ref) = &endpoint.target_ref else {
            continue;
        };
        if target_ref.kind != "Pod" {
            continue;
        }

        let workload = workload::infer(&target_ref.pod_name, &slice.service_name);
        let metadata = PodMetadata {
            workload,
            namespace: slice.namespace.clone(),
            node: endpoint.node_name.clone().unwrap_or_default(),
        };

        for address in &endpoint.addresses {
            out.push((address.clone(), metadata.clone()));
            for port in &slice.ports {
                out.push((format!("{address}:{port}"), metadata.clone()));
            }
        }
    }

    out
}

/// Reconciles `SliceEvent`s against the address index, maintaining the
/// `sliceToKeys` reverse index invariant: every key in the address index
/// is reachable from exactly one `SliceKeys` entry (§3).
pub struct EndpointSliceWatcher {
    index: Arc<AddressIndex>,
    slice_keys: Arc<SliceKeys>,
    deleter: Arc<DelayedDeleter>,
}

impl EndpointSliceWatcher {
    pub fn new(index: Arc<AddressIndex>, slice_keys: Arc<SliceKeys>, delete_delay: Duration) -> Self {
        Self {
            deleter: Arc::new(DelayedDeleter::new(index.clone(), delete_delay)),
            index,
            slice_keys,
        }
    }

    /// Drives the reconciliation loop over a stream of slice events until
    /// the stream ends. The caller is responsible for stopping the stream
    /// on shutdown; outstanding delayed deletes are joined separately via
    /// [`EndpointSliceWatcher::join_delayed_deletes`].
    pub async fn run<S>(&self, mut events: S)
    where
        S: futures::Stream<Item = SliceEvent> + Unpin,
    {
        use futures::StreamExt;

        while let Some(event) = events.next().await {
            self.handle(event);
        }
    }

    pub fn handle(&self, event: SliceEvent) {
        match event {
            SliceEvent::Applied(slice) => self.apply(slice),
            SliceEvent::Deleted { uid } => self.delete(&uid),
        }
    }

    fn apply(&self, slice: SliceView) {
        let new_keys = key_set(&slice);
        let new_key_set: HashSet<String> = new_keys.iter().map(|(k, _)| k.clone()).collect();

        let old_keys = self.slice_keys.get(&slice.uid).unwrap_or_default();

        for old_key in old_keys.difference(&new_key_set) {
            if let Some(expected) = self.index.get(old_key) {
                self.deleter.schedule(old_key.clone(), expected);
            }
        }

        for (key, metadata) in &new_keys {
            if !old_keys.contains(key) {
                self.index.insert(key.clone(), metadata.clone());
            }
        }

        self.slice_keys.set(slice.uid, new_key_set);
    }

    fn delete(&self, uid: &str) {
        let Some(keys) = self.slice_keys.remove(uid) else {
            return;
        };

        for key in keys {
            if let Some(expected) = self.index.get(&key) {
                self.deleter.schedule(key, expected);
            }
        }
    }

    pub async fn join_delayed_deletes(&self) {
        self.deleter.join_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(uid: &str, service: &str, pod: &str, addrs: &[&str], ports: &[u16]) -> SliceView {
        SliceView {
            uid: uid.to_string(),
            namespace: "testns".to_string(),
            service_name: service.to_string(),
            endpoints: vec![Endpoint {
                target_ref: Some(EndpointRef {
                    kind: "Pod".to_string(),
                    pod_name: pod.to_string(),
                }),
                node_name: None,
                addresses: addrs.iter().map(|a| a.to_string()).collect(),
            }],
            ports: ports.to_vec(),
        }
    }

    #[test]
    fn s2_endpointslice_add() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_secs(60));

        watcher.handle(SliceEvent::Applied(slice(
            "u1", "mysvc", "workload-69dww", &["1.2.3.4"], &[80],
        )));

        let meta = index.get("1.2.3.4").unwrap();
        assert_eq!(meta.workload, "workload");
        assert_eq!(meta.namespace, "testns");
        assert_eq!(index.get("1.2.3.4:80").unwrap().workload, "workload");

        let keys = slice_keys.get("u1").unwrap();
        assert_eq!(keys, HashSet::from(["1.2.3.4".to_string(), "1.2.3.4:80".to_string()]));
    }

    #[test]
    fn node_name_is_per_endpoint_not_slice_wide() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_secs(60));

        watcher.handle(SliceEvent::Applied(SliceView {
            endpoints: vec![
                Endpoint {
                    target_ref: Some(EndpointRef {
                        kind: "Pod".to_string(),
                        pod_name: "workload-69dww".to_string(),
                    }),
                    node_name: Some("node-a".to_string()),
                    addresses: vec!["1.2.3.4".to_string()],
                },
                Endpoint {
                    target_ref: Some(EndpointRef {
                        kind: "Pod".to_string(),
                        pod_name: "workload-45678".to_string(),
                    }),
                    node_name: Some("node-b".to_string()),
                    addresses: vec!["1.2.3.5".to_string()],
                },
            ],
            ..slice("u1", "mysvc", "unused", &[], &[])
        }));

        assert_eq!(index.get("1.2.3.4").unwrap().node, "node-a");
        assert_eq!(index.get("1.2.3.5").unwrap().node, "node-b");
    }

    #[tokio::test]
    async fn s3_update_with_partial_overlap_has_no_delete_for_shared_keys() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_millis(5));

        watcher.handle(SliceEvent::Applied(slice(
            "u1", "mysvc", "workload-69dww", &["1.2.3.4"], &[80],
        )));

        watcher.handle(SliceEvent::Applied(SliceView {
            endpoints: vec![Endpoint {
                target_ref: Some(EndpointRef {
                    kind: "Pod".to_string(),
                    pod_name: "workload-69dww".to_string(),
                }),
                node_name: None,
                addresses: vec!["1.2.3.4".to_string(), "1.2.3.5".to_string()],
            }],
            ..slice("u1", "mysvc", "workload-69dww", &[], &[80])
        }));

        watcher.join_delayed_deletes().await;

        // Shared keys (1.2.3.4, 1.2.3.4:80) must still be present, not
        // merely re-inserted but never scheduled for deletion.
        assert!(index.get("1.2.3.4").is_some());
        assert!(index.get("1.2.3.4:80").is_some());
        assert!(index.get("1.2.3.5").is_some());
        assert!(index.get("1.2.3.5:80").is_some());

        let keys = slice_keys.get("u1").unwrap();
        assert_eq!(keys.len(), 4);
    }

    #[tokio::test]
    async fn update_removing_a_key_schedules_delayed_delete() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_millis(1));

        watcher.handle(SliceEvent::Applied(slice(
            "u1", "mysvc", "workload-69dww", &["1.2.3.4", "1.2.3.5"], &[],
        )));
        assert!(index.get("1.2.3.5").is_some());

        watcher.handle(SliceEvent::Applied(slice(
            "u1", "mysvc", "workload-69dww", &["1.2.3.4"], &[],
        )));
        watcher.join_delayed_deletes().await;

        assert!(index.get("1.2.3.4").is_some());
        assert!(index.get("1.2.3.5").is_none());
    }

    #[tokio::test]
    async fn delete_schedules_removal_of_every_owned_key_and_clears_reverse_index() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_millis(1));

        watcher.handle(SliceEvent::Applied(slice(
            "u1", "mysvc", "workload-69dww", &["1.2.3.4"], &[80],
        )));
        watcher.handle(SliceEvent::Deleted { uid: "u1".to_string() });
        watcher.join_delayed_deletes().await;

        assert!(index.get("1.2.3.4").is_none());
        assert!(index.get("1.2.3.4:80").is_none());
        assert!(slice_keys.get("u1").is_none());
    }

    #[test]
    fn delete_of_unknown_uid_is_a_noop() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_secs(60));

        watcher.handle(SliceEvent::Deleted { uid: "missing".to_string() });
        assert!(index.is_empty());
    }

    #[test]
    fn endpoint_with_non_pod_target_is_discarded() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = EndpointSliceWatcher::new(index.clone(), slice_keys.clone(), Duration::from_secs(60));

        watcher.handle(SliceEvent::Applied(SliceView {
            endpoints: vec![Endpoint {
                target_ref: Some(EndpointRef {
                    kind: "Node".to_string(),
                    pod_name: "irrelevant".to_string(),
                }),
                node_name: None,
                addresses: vec!["1.2.3.4".to_string()],
            }],
            ..slice("u1", "mysvc", "irrelevant", &[], &[])
        }));

        assert!(index.is_empty());
    }
}
