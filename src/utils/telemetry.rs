// src/utils/telemetry.rs
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::{TaxiError, TaxiResult};
use crate::state::{LogFormat, LoggingConfig};

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_telemetry(config: &LoggingConfig) -> TaxiResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| TaxiError::InvalidConfiguration(format!("log level: {}", e)))?;

    let registry = Registry::default().with(env_filter);

    let result = match config.format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).flatten_event(true))
            .try_init(),
    };
    result.map_err(|e| TaxiError::InvalidConfiguration(format!("tracing subscriber: {}", e)))?;

    tracing::info!(
        log_level = %config.level,
        log_format = ?config.format,
        "Telemetry initialized"
    );
    Ok(())
}
