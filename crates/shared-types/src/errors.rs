//! # Error Types
//!
//! Defines error types shared by the services and the runtime.

use crate::entities::ServiceState;
use thiserror::Error;

/// Errors from data source service lifecycle operations.
///
/// Lookup failures are never surfaced through this type; they are reported
/// as log events on the bus.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The service was stopped and cannot be started again.
    #[error("{service}: service has been stopped")]
    Stopped { service: String },

    /// The service is in a state that does not allow the operation.
    #[error("{service}: invalid transition from {from}")]
    InvalidState { service: String, from: ServiceState },

    /// The service could not build a collaborator it needs.
    #[error("{service}: initialization failed: {reason}")]
    InitializationFailed { service: String, reason: String },
}

/// Errors raised while loading or mutating the scan configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A domain name was rejected.
    #[error("Invalid domain name: {0:?}")]
    InvalidDomain(String),

    /// The validator for a domain could not be compiled.
    #[error("Failed to build validator for {domain}: {source}")]
    Validator {
        domain: String,
        #[source]
        source: regex::Error,
    },
}
