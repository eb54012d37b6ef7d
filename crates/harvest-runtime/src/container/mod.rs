//! # Container
//!
//! Configuration resolution and construction of the per-run services.

pub mod config;
pub mod services;

pub use config::{RuntimeConfig, RuntimeConfigError};
pub use services::ServiceContainer;

use datasrcs::HttpError;
use thiserror::Error;

/// Errors raised while building the service container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] HttpError),

    #[error("Unknown data source {0:?}")]
    UnknownSource(String),
}
