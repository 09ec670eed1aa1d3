//! Diagnostics logging setup

use crate::error::{Result, StopError};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| StopError::LoggingInit(e.to_string()))?;

    debug!(level, "tracing initialized");
    Ok(())
}
