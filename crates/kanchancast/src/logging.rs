//! Process-wide log subscriber setup.
//!
//! The tracker emits `tracing` events and the storage layer uses the `log`
//! facade; both end up in the same subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

/// Builds the event filter. `RUST_LOG`, when set and valid, wins over the
/// configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| ConfigError::Validation {
        message: format!("Invalid logging level '{}': {}", level, e),
    })
}

/// Installs the global subscriber.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// calling this more than once is harmless.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
                .is_ok()
        }
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_current_span(true)),
        )
        .is_ok(),
    };

    if installed {
        if let Err(e) = tracing_log::LogTracer::init() {
            tracing::debug!("log facade already bridged: {}", e);
        }
        tracing::debug!(format = ?config.format, "Logging initialized");
    }

    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_build_filter_uses_configured_level() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter("kanchancast=debug").unwrap();
        assert!(filter.to_string().contains("kanchancast=debug"));
    }

    #[test]
    #[serial]
    fn test_build_filter_prefers_env() {
        std::env::set_var("RUST_LOG", "kanchancast=trace");
        let filter = build_filter("info").unwrap();
        std::env::remove_var("RUST_LOG");
        assert!(filter.to_string().contains("kanchancast=trace"));
    }

    #[test]
    #[serial]
    fn test_build_filter_rejects_garbage() {
        std::env::remove_var("RUST_LOG");
        assert!(build_filter("kanchancast=loud").is_err());
    }

    #[test]
    #[serial]
    fn test_init_logging_is_idempotent() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig::default();
        let first = init_logging(&config).unwrap();
        let second = init_logging(&config).unwrap();
        assert!(first);
        assert!(!second);
    }
}
