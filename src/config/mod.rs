use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

mod general;
mod kubernetes;
mod log;
mod prometheus;
mod reload;
mod target_allocator;

use general::General;
use kubernetes::Kubernetes;
pub use log::Log;
use prometheus::Prometheus;
pub use reload::ConfigWatcher;
use target_allocator::TargetAllocator;

#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    general: General,
    #[serde(default)]
    log: Log,
    #[serde(default)]
    prometheus: Prometheus,
    #[serde(default)]
    target_allocator: TargetAllocator,
    #[serde(default)]
    kubernetes: Kubernetes,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let content = std::fs::read_to_string(path.as_ref()).unwrap_or_else(|e| {
            eprintln!("unable to open config file: {e}");
            std::process::exit(1);
        });

        let config: Config = toml::from_str(&content).unwrap_or_else(|e| {
            eprintln!("failed to parse config file: {e}");
            std::process::exit(1);
        });

        config.general.check();
        config.prometheus.check();
        config.target_allocator.check();
        config.kubernetes.check();

        config
    }

    pub fn general(&self) -> &General {
        &self.general
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn prometheus(&self) -> &Prometheus {
        &self.prometheus
    }

    pub fn target_allocator(&self) -> &TargetAllocator {
        &self.target_allocator
    }

    pub fn kubernetes(&self) -> &Kubernetes {
        &self.kubernetes
    }

    /// The delete delay the Kubernetes watcher should actually use:
    /// `kubernetes.delete_delay` if set, else `general.delete_delay`.
    pub fn effective_delete_delay(&self) -> Duration {
        self.kubernetes
            .delete_delay()
            .unwrap_or_else(|| self.general.delete_delay())
    }
}
