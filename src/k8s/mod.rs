//! Kubernetes enrichment: an `EndpointSlice` watcher maintaining a
//! concurrent address index used to attach workload/namespace/node
//! metadata to materialized points.

pub mod address_index;
pub mod delayed_delete;
pub mod kube_adapter;
pub mod watcher;
pub mod workload;

pub use address_index::{AddressIndex, PodMetadata, SliceKeys};
pub use watcher::{EndpointSliceWatcher, SliceEvent, SliceView};
