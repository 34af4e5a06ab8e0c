use std::sync::Arc;

use crate::accumulator::Accumulator;
use crate::delta::DeltaCalculator;
use crate::emf;
use crate::filter::Filter;
use crate::merge::Merger;
use crate::metadata::MetadataService;
use crate::queue::BatchReceiver;
use crate::resolver::TypeResolver;
use crate::sample::Batch;
use crate::shutdown::Shutdown;

/// Runs the resolver → filter → delta → merge → EMF metadata → accumulator
/// chain for each batch taken off the queue.
///
/// Single-threaded by construction (§5): one `Handler` drives the queue's
/// only consumer, so its delta calculator's state map never needs to be
/// shared.
pub struct Handler {
    metadata: Arc<dyn MetadataService>,
    filter: Filter,
    delta: DeltaCalculator,
    accumulator: Arc<dyn Accumulator>,
    cluster_name: Option<String>,
}

impl Handler {
    pub fn new(
        metadata: Arc<dyn MetadataService>,
        accumulator: Arc<dyn Accumulator>,
        cluster_name: Option<String>,
    ) -> Self {
        Self {
            metadata,
            filter: Filter::new(),
            delta: DeltaCalculator::new(),
            accumulator,
            cluster_name,
        }
    }

    /// Processes one batch, emitting zero or more materialized points to
    /// the accumulator.
    pub fn process(&mut self, batch: Batch) {
        let resolver = TypeResolver::new(self.metadata.as_ref());
        let batch = match resolver.resolve(batch) {
            Ok(batch) => batch,
            Err(err) => {
                error!("dropping batch: {err}");
                return;
            }
        };

        let batch = self.filter.apply(batch);

        let deltad: Batch = batch
            .into_iter()
            .filter_map(|sample| self.delta.apply(sample))
            .collect();

        for mut point in Merger::merge(deltad) {
            emf::attach(&mut point, self.cluster_name.as_deref());
            self.accumulator.add_fields("prometheus", &point);
        }
    }

    /// Consumes the queue until it closes or shutdown is signaled, at
    /// which point the queue is drained once more before returning.
    pub async fn run(mut self, mut queue: BatchReceiver, shutdown: Shutdown) {
        loop {
            tokio::select! {
                biased;

                batch = queue.recv() => match batch {
                    Some(batch) => self.process(batch),
                    None => break,
                },
                _ = shutdown.signaled() => {
                    while let Some(batch) = queue.try_recv() {
                        self.process(batch);
                    }
                    break;
                }
            }
        }
    }
}
