// ==============
// crates/backend-lib/src/logging.rs

//! Tracing subscriber setup shared by both services.
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LogFormat, LoggingSettings};

/// Install the global subscriber. `RUST_LOG` overrides `settings.level`.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    installed.map_err(|e| ConfigError::Logging(e.to_string()))
}
