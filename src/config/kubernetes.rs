use serde::Deserialize;

/// Configuration for the `EndpointSlice` watcher (§4.7).
#[derive(Deserialize, Default)]
pub struct Kubernetes {
    #[serde(default)]
    enabled: bool,

    /// Overrides `general.delete_delay` for this watcher specifically.
    #[serde(default)]
    delete_delay: Option<String>,
}

impl Kubernetes {
    pub fn check(&self) {
        if let Some(ref delay) = self.delete_delay {
            if let Err(e) = delay.parse::<humantime::Duration>() {
                eprintln!("kubernetes.delete_delay couldn't be parsed: {e}");
                std::process::exit(1);
            }
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn delete_delay(&self) -> Option<std::time::Duration> {
        self.delete_delay
            .as_ref()
            .map(|d| *d.parse::<humantime::Duration>().unwrap())
    }
}
