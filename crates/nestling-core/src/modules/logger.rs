//! Tracing subscriber bootstrap.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if fmt().with_env_filter(filter).with_target(false).try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
