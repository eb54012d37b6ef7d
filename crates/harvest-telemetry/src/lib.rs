//! # Harvest Telemetry
//!
//! Logging setup shared by the harvester binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use harvest_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     harvest_telemetry::log_event!(info, "runtime", "ready");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HARVEST_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `HARVEST_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `HARVEST_JSON_LOGS` | `false` | JSON instead of human-readable lines |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}

/// Initialize logging for the process.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
