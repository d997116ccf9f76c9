// Tracing setup. The level comes from RUST_LOG, else from the logging config,
// and can be swapped later without reinstalling the subscriber.
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

pub fn init_tracing(logging: &LoggingConfig) {
    init_tracing_with_level(&logging.level);
}

pub fn init_tracing_with_level(level: &str) {
    let filter = match std::env::var_os("RUST_LOG") {
        Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        None => EnvFilter::new(level),
    };

    let (filter_layer, handle) = reload::Layer::new(filter);
    if FILTER_HANDLE.set(handle).is_err() {
        return;
    }

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("A global subscriber was already installed");
    }
}

/// Swaps the log level at runtime. Returns `false` before initialization.
pub fn apply_logging_level(level: &str) -> bool {
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };
    handle.modify(|filter| *filter = EnvFilter::new(level)).is_ok()
}
