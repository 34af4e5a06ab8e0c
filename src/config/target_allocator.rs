use serde::Deserialize;

fn ca_path() -> String {
    "/etc/amazon-cloudwatch-observability-agent-cert/tls-ca.crt".into()
}

fn reload_interval() -> String {
    "30s".into()
}

/// Configuration for the optional target-allocator client that
/// distributes scrape targets across collector replicas. Not exercised by
/// this crate's core pipeline; present so a deployment can enable it
/// without the config file rejecting the section as unknown.
#[derive(Deserialize, Default)]
pub struct TargetAllocator {
    #[serde(default)]
    enabled: bool,

    #[serde(default)]
    collector_id: Option<String>,

    #[serde(default = "ca_path")]
    ca_path: String,

    #[serde(default = "reload_interval")]
    reload_interval: String,
}

impl TargetAllocator {
    pub fn check(&self) {
        if !self.enabled {
            return;
        }

        if self.collector_id.as_deref().unwrap_or("").trim().is_empty() {
            eprintln!("target_allocator.collector_id is required when target_allocator is enabled");
            std::process::exit(1);
        }

        if !std::path::Path::new(&self.ca_path).exists() {
            eprintln!("target_allocator CA file not found: {}", self.ca_path);
            std::process::exit(1);
        }

        if let Err(e) = self.reload_interval.parse::<humantime::Duration>() {
            eprintln!("target_allocator.reload_interval couldn't be parsed: {e}");
            std::process::exit(1);
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn collector_id(&self) -> Option<&str> {
        self.collector_id.as_deref()
    }

    pub fn ca_path(&self) -> &str {
        &self.ca_path
    }

    pub fn reload_interval(&self) -> std::time::Duration {
        *self.reload_interval.parse::<humantime::Duration>().unwrap()
    }
}
