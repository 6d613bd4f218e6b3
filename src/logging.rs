//! Tracing subscriber setup for binaries and tests.

use crate::error::{DbError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber filtered by `filter`
/// (any `EnvFilter` directive, e.g. `"info"` or `"minidb=debug"`).
pub fn init_logging(filter: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(filter)
                .map_err(|e| DbError::Configuration(format!("Invalid log filter: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| DbError::Configuration("Logging already initialized".into()))
}
