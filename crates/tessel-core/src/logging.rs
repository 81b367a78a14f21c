//! Logging setup built on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Default filter used by [`init`].
pub const DEFAULT_FILTER: &str = "info,tessel_ui=debug";

/// Install a formatted subscriber with the default filter.
///
/// `RUST_LOG` overrides the default when set.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a formatted subscriber with an explicit filter directive.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_with_filter(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let result = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    if result.is_err() {
        tracing::trace!("tracing subscriber already installed");
    }
}
