//! Tracing subscriber setup.
//!
//! Library code logs through `log` and `tracing`; binaries call [`init`] once.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::LoggingError;

/// Installs the global subscriber and bridges `log` records into it.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let directive = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone());
    let filter = build_filter(&directive)?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
        }
        LogFormat::Json => tracing::subscriber::set_global_default(registry.with(fmt::layer().json())),
    }
    .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| LoggingError::Install(e.to_string()))
}

fn build_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directive).map_err(|e| LoggingError::InvalidFilter {
        filter: directive.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("worksheet_parsing=debug,warn").is_ok());
    }

    #[test]
    fn test_build_filter_rejects_bad_level() {
        let err = build_filter("worksheet_parsing=loud").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { ref filter, .. } if filter == "worksheet_parsing=loud"));
    }
}
