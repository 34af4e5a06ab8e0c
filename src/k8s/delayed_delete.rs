use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::k8s::address_index::{AddressIndex, PodMetadata};
use crate::metrics;

/// Schedules removals from the address index after a configurable delay,
/// to mask brief flaps during rolling updates.
///
/// At fire time the scheduler checks that the key's current value still
/// matches the identity it was scheduled against, so a key that was
/// concurrently re-bound to a new pod is not deleted out from under it.
/// Tasks are detached but tracked so they can be joined on shutdown.
pub struct DelayedDeleter {
    delay: Duration,
    index: Arc<AddressIndex>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DelayedDeleter {
    pub fn new(index: Arc<AddressIndex>, delay: Duration) -> Self {
        Self {
            delay,
            index,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Schedules `key` for removal, provided its value at fire time is
    /// still `expected`.
    pub fn schedule(&self, key: String, expected: PodMetadata) {
        let index = self.index.clone();
        let delay = self.delay;

        metrics::DELAYED_DELETES_SCHEDULED.increment();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if index.remove_if_unchanged(&key, &expected) {
                metrics::DELAYED_DELETES_FIRED.increment();
            } else {
                metrics::DELAYED_DELETES_SUPERSEDED.increment();
            }
        });

        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Waits for every outstanding delayed delete to finish or be
    /// abandoned. Idempotent deletes mean it is safe for in-flight
    /// deletes to simply be allowed to fire during shutdown instead.
    pub async fn join_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }
}
