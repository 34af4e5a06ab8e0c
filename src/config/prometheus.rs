use serde::Deserialize;

fn config_path() -> String {
    "/etc/prometheus/prometheus.yaml".into()
}

#[derive(Deserialize)]
pub struct Prometheus {
    /// Path the scrape config reload watcher observes (§4.10). The scrape
    /// config schema itself is out of scope here; a change to this file is
    /// only used to signal a reload attempt.
    #[serde(default = "config_path")]
    config_path: String,
}

impl Default for Prometheus {
    fn default() -> Self {
        Self {
            config_path: config_path(),
        }
    }
}

impl Prometheus {
    pub fn check(&self) {
        if self.config_path.trim().is_empty() {
            eprintln!("prometheus.config_path must not be empty");
            std::process::exit(1);
        }
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }
}
