//! Subscriber installation and structured logging helpers.
//!
//! Logs always go to stderr so stdout stays reserved for scan results.
//! Every record emitted through [`log_event!`](crate::log_event) carries a
//! `source` field naming the data source or component it concerns.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    if !config.console_output {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()));
    }

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))
    }
}

/// Helper to create structured log entries tagged with their source.
#[macro_export]
macro_rules! log_event {
    (info, $source:expr, $msg:expr $(, $($field:tt)*)?) => {
        ::tracing::info!(
            source = $source,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $source:expr, $msg:expr $(, $($field:tt)*)?) => {
        ::tracing::warn!(
            source = $source,
            $($($field)*,)?
            $msg
        )
    };

    (error, $source:expr, $msg:expr $(, $($field:tt)*)?) => {
        ::tracing::error!(
            source = $source,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $source:expr, $msg:expr $(, $($field:tt)*)?) => {
        ::tracing::debug!(
            source = $source,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a discovery with standard fields.
#[macro_export]
macro_rules! log_discovery {
    ($level:ident, $source:expr, $msg:expr, $name:expr, $domain:expr $(, $($field:tt)*)?) => {
        ::tracing::$level!(
            source = $source,
            name = %$name,
            domain = %$domain,
            $($($field)*,)?
            $msg
        )
    };
}
