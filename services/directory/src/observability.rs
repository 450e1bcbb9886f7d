//! Tracing setup for the directory binary.
//!
//! Initialization is guarded by `OnceLock` to keep startup idempotent in tests.
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBS_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber: `RUST_LOG` filter (default `info`) and a
/// stderr fmt layer so command output on stdout stays machine-readable.
pub fn init_observability(service_name: &str) {
    OBS_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
        tracing::debug!(service = service_name, "observability initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_observability_is_idempotent() {
        init_observability("directory-test");
        init_observability("directory-test");
    }
}
