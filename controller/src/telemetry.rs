//! Structured logging setup: a layered `tracing_subscriber::Registry` with a plain
//! `fmt` layer.

use snafu::ResultExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::error::{self, Result};

/// Maps a numeric verbosity (0 through 5) to its `tracing` level name.
pub fn level_name(log_level: u8) -> &'static str {
    match log_level {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Initializes the global `tracing` subscriber. `default_filter` is only used as a
/// fallback when `RUST_LOG` is unset.
pub fn init_telemetry(default_filter: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber).context(error::TracingConfigurationSnafu)
}
