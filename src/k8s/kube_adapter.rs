//! Production adapter from `kube`'s typed `EndpointSlice` watch stream to
//! the [`SliceEvent`] shape the reconciliation logic in
//! [`crate::k8s::watcher`] actually consumes.
//!
//! Kept separate from `watcher.rs` so the reconciliation logic can be
//! exercised against a synthetic stream in tests without pulling in a
//! cluster connection.

use futures::{Stream, StreamExt};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::runtime::watcher::{self, Event};
use kube::{Api, Client};
use tokio::sync::watch;

use crate::k8s::watcher::{Endpoint, EndpointRef, SliceEvent, SliceView};

const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

/// Signals whether the watcher's initial list has been processed, so
/// startup can block on it the way §4.7 describes rather than polling.
#[derive(Clone)]
pub struct Readiness {
    synced: watch::Receiver<bool>,
}

impl Readiness {
    pub async fn wait_for_cache_sync(&mut self) {
        if *self.synced.borrow() {
            return;
        }
        let _ = self.synced.wait_for(|synced| *synced).await;
    }
}

/// Strips every field the watcher does not consult — annotations, managed
/// fields, finalizers, per-endpoint hostname/zone/hints — keeping only
/// what [`crate::k8s::watcher::EndpointSliceWatcher`] needs (§4.7's
/// transform step).
fn transform(slice: EndpointSlice) -> Option<SliceView> {
    let uid = slice.metadata.uid?;
    let namespace = slice.metadata.namespace.unwrap_or_default();
    let service_name = slice
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(SERVICE_NAME_LABEL))
        .cloned()
        .unwrap_or_default();

    let ports = slice
        .ports
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.port)
        .filter_map(|p| u16::try_from(p).ok())
        .collect();

    let endpoints = slice
        .endpoints
        .into_iter()
        .map(|ep| {
            let target_ref = ep.target_ref.map(|r| EndpointRef {
                kind: r.kind.unwrap_or_default(),
                pod_name: r.name.unwrap_or_default(),
            });
            Endpoint {
                target_ref,
                node_name: ep.node_name,
                addresses: ep.addresses,
            }
        })
        .collect();

    Some(SliceView {
        uid,
        namespace,
        service_name,
        endpoints,
        ports,
    })
}

fn into_slice_events(event: watcher::Result<Event<EndpointSlice>>) -> Vec<SliceEvent> {
    match event {
        Ok(Event::Apply(slice)) => transform(slice).map(SliceEvent::Applied).into_iter().collect(),
        Ok(Event::Delete(slice)) => slice
            .metadata
            .uid
            .map(|uid| SliceEvent::Deleted { uid })
            .into_iter()
            .collect(),
        Ok(Event::Init) | Ok(Event::InitApply(_)) | Ok(Event::InitDone) => Vec::new(),
        Err(err) => {
            warn!("endpointslice watch error: {err}");
            Vec::new()
        }
    }
}

/// Starts a cluster-wide `EndpointSlice` watch and returns the
/// [`SliceEvent`] stream plus a [`Readiness`] handle that resolves once
/// the initial list has synced.
pub fn watch_endpoint_slices(client: Client) -> (impl Stream<Item = SliceEvent>, Readiness) {
    let api: Api<EndpointSlice> = Api::all(client);
    let (tx, rx) = watch::channel(false);

    let stream = watcher::watcher(api, watcher::Config::default()).flat_map(move |event| {
        if matches!(event, Ok(Event::InitDone)) {
            let _ = tx.send(true);
        }
        futures::stream::iter(into_slice_events(event))
    });

    (stream, Readiness { synced: rx })
}
