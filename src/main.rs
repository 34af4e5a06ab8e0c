#[macro_use]
extern crate ringlog;

use std::path::PathBuf;
use std::sync::Arc;

use backtrace::Backtrace;
use clap::Parser;
use kube::Client;
use ringlog::{LogBuilder, MultiLogBuilder, Output, Stderr};

mod accumulator;
mod appender;
mod config;
mod delta;
mod emf;
mod error;
mod filter;
mod fingerprint;
mod handler;
mod k8s;
mod merge;
mod metadata;
mod metrics;
mod queue;
mod resolver;
mod sample;
mod shutdown;

use accumulator::StdoutAccumulator;
use config::Config;
use handler::Handler;
use k8s::{AddressIndex, EndpointSliceWatcher, SliceKeys};
use metadata::StaticMetadataService;
use queue::BatchQueue;
use shutdown::Shutdown;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"), version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Ingests Prometheus-shaped scrapes, resolves and deltas counters, \
enriches with Kubernetes workload metadata, and emits EMF-tagged points.")]
struct Cli {
    /// Path to the TOML configuration file.
    config: PathBuf,
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{info}");
        eprintln!("{:?}", Backtrace::new());
        std::process::exit(101);
    }));

    let cli = Cli::parse();

    let config = Config::load(&cli.config);

    let debug_output: Box<dyn Output> = Box::new(Stderr::new());
    let level = config.log().level();

    let debug_log = if level <= ringlog::Level::Info {
        LogBuilder::new().format(ringlog::default_format)
    } else {
        LogBuilder::new()
    }
    .output(debug_output)
    .build()
    .expect("failed to initialize debug log");

    let mut log = MultiLogBuilder::new()
        .level_filter(level.to_level_filter())
        .default(debug_log)
        .build()
        .start();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("prom-emf-ingest")
        .build()
        .expect("failed to launch async runtime");

    rt.spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            let _ = log.flush();
        }
    });

    rt.block_on(run(config));
}

async fn run(config: Config) {
    let shutdown = Shutdown::new();

    let shutdown_for_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        warn!("received interrupt, shutting down");
        shutdown_for_signal.signal();
    })
    .expect("failed to install signal handler");

    let _config_watcher = config::ConfigWatcher::start(config.prometheus().config_path());

    let (queue, receiver) = BatchQueue::new(config.general().queue_capacity());

    // The scrape layer that populates the metadata service and drives
    // `queue` is an external collaborator out of scope for this crate
    // (§1); `StaticMetadataService` stands in as the seam's production
    // shape until that layer is wired in.
    let metadata = Arc::new(StaticMetadataService::new());
    let accumulator = Arc::new(StdoutAccumulator);
    let handler = Handler::new(metadata, accumulator, config.general().cluster_name().map(str::to_string));

    let handler_shutdown = shutdown.clone();
    let handler_task = tokio::spawn(handler.run(receiver, handler_shutdown));

    // `queue` is the seam scrape appenders would hold clones of; kept
    // alive here so the handler's receiver does not observe a closed
    // channel before shutdown since that scrape layer is out of scope
    // for this crate (§1).
    let _queue = queue;

    let k8s_watcher = if config.kubernetes().enabled() {
        let index = Arc::new(AddressIndex::new());
        let slice_keys = Arc::new(SliceKeys::new());
        let watcher = Arc::new(EndpointSliceWatcher::new(
            index,
            slice_keys,
            config.effective_delete_delay(),
        ));

        let client = Client::try_default()
            .await
            .expect("failed to construct Kubernetes client");
        let (events, mut readiness) = k8s::kube_adapter::watch_endpoint_slices(client);

        let run_watcher = watcher.clone();
        let watcher_shutdown = shutdown.clone();
        let watcher_task = tokio::spawn(async move {
            use futures::StreamExt;
            tokio::pin!(events);

            loop {
                tokio::select! {
                    biased;

                    event = events.next() => match event {
                        Some(event) => run_watcher.handle(event),
                        None => break,
                    },
                    _ = watcher_shutdown.signaled() => break,
                }
            }
        });

        readiness.wait_for_cache_sync().await;
        info!("endpointslice watcher cache synced");

        Some((watcher, watcher_task))
    } else {
        None
    };

    shutdown.signaled().await;

    let _ = handler_task.await;

    if let Some((watcher, watcher_task)) = k8s_watcher {
        let _ = watcher_task.await;
        watcher.join_delayed_deletes().await;
    }
}
