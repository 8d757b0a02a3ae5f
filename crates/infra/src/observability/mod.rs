//! Tracing initialisation
//!
//! Installs a global `tracing-subscriber` registry with an [`EnvFilter`]
//! (`RUST_LOG` overrides the configured level) and either human-readable
//! or JSON formatted output.

use backoffice_domain::{BackofficeError, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter from `RUST_LOG`, else `config.level`.
///
/// # Errors
/// Returns `BackofficeError::Config` when the configured directive does not
/// parse.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, BackofficeError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            BackofficeError::Config(format!("invalid log level `{}`: {e}", config.level))
        }),
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, so calling
/// this twice (tests, embedding hosts) is harmless.
///
/// # Errors
/// Returns `BackofficeError::Config` for an invalid level directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool, BackofficeError> {
    let filter = env_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    Ok(installed.is_ok())
}
