use tokio::sync::mpsc;

use crate::metrics;
use crate::sample::Batch;

/// Capacity of the bounded queue between scrape-loop appenders and the
/// handler task, per §5.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Multi-producer handle onto the bounded batch queue.
///
/// `commit` (via `try_send`) never blocks: under sustained overload the
/// queue drops the incoming batch rather than applying backpressure to the
/// scrape loop, on the theory that retaining stale metrics is worse than
/// shedding them.
#[derive(Clone)]
pub struct BatchQueue {
    tx: mpsc::Sender<Batch>,
}

impl BatchQueue {
    pub fn new(capacity: usize) -> (Self, BatchReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, BatchReceiver { rx })
    }

    /// Attempts to enqueue `batch`. Returns `true` if it was enqueued and
    /// `false` if it was dropped because the queue was full.
    pub fn try_send(&self, batch: Batch) -> bool {
        match self.tx.try_send(batch) {
            Ok(()) => {
                metrics::BATCHES_COMMITTED.increment();
                true
            }
            Err(_) => {
                warn!("queue is at capacity, dropping batch");
                metrics::BATCHES_DROPPED.increment();
                false
            }
        }
    }
}

/// The handler's single-consumer end of the queue.
pub struct BatchReceiver {
    rx: mpsc::Receiver<Batch>,
}

impl BatchReceiver {
    /// Blocks until a batch is available or the queue is closed (all
    /// senders dropped, e.g. during shutdown).
    pub async fn recv(&mut self) -> Option<Batch> {
        self.rx.recv().await
    }

    /// Non-blocking receive, used in tests.
    pub fn try_recv(&mut self) -> Option<Batch> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use std::collections::BTreeMap;

    #[test]
    fn full_queue_drops_without_blocking() {
        let (queue, mut rx) = BatchQueue::new(1);

        let mut batch = Batch::new();
        batch.push(Sample::new("m", 1, 1.0, BTreeMap::new()));

        assert!(queue.try_send(batch.clone()));
        // Queue is now at exactly capacity; the next commit must be
        // dropped, not block.
        assert!(!queue.try_send(batch));

        assert!(rx.try_recv().is_some());
        assert!(rx.try_recv().is_none());
    }
}
