//! Logging setup for programs embedding notewise.

use noteconf::{ConfigError, LoggingConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::Result;

/// Install a fmt subscriber filtered by `config.level`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level).map_err(|e| ConfigError::Invalid {
        key: "logging.level".to_string(),
        message: e.to_string(),
    })?;

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        debug!("tracing subscriber already installed");
    }

    Ok(())
}
