use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// An idempotent-closeable shutdown signal observed by every long-running
/// task: the scrape layer, the handler, the watcher's informer loop, and
/// any outstanding delayed-delete timers.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    closed: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals shutdown. Safe to call more than once; only the first call
    /// has any effect.
    pub fn signal(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.tx.send(true);
    }

    pub fn is_signaled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been signaled. Cheap to call from every
    /// task's select loop.
    pub async fn signaled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
