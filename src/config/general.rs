use serde::Deserialize;

fn queue_capacity() -> usize {
    10_000
}

fn delete_delay() -> String {
    "60s".into()
}

#[derive(Deserialize)]
pub struct General {
    /// Attached to every materialized point as the `ClusterName` tag,
    /// unless a per-target relabel already set one (§4.6).
    #[serde(default)]
    cluster_name: Option<String>,

    #[serde(default = "queue_capacity")]
    queue_capacity: usize,

    /// Default delay before a key removed from an EndpointSlice is
    /// actually evicted from the address index.
    #[serde(default = "delete_delay")]
    delete_delay: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            cluster_name: None,
            queue_capacity: queue_capacity(),
            delete_delay: delete_delay(),
        }
    }
}

impl General {
    pub fn check(&self) {
        if self.queue_capacity == 0 {
            eprintln!("general.queue_capacity must be non-zero");
            std::process::exit(1);
        }

        if let Err(e) = self.delete_delay.parse::<humantime::Duration>() {
            eprintln!("general.delete_delay couldn't be parsed: {e}");
            std::process::exit(1);
        }
    }

    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn delete_delay(&self) -> std::time::Duration {
        *self.delete_delay.parse::<humantime::Duration>().unwrap()
    }
}
