//! # Shared Types Crate
//!
//! This crate contains the domain entities, errors, configuration and rate
//! limiting primitives used by every data source service and by the runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every record crossing the event bus is
//!   defined here.
//! - **No Ambient State**: configuration is an explicit value handed to the
//!   services, never a global.
//! - **Owned Limits**: each service owns its own `RateLimiter`; nothing here
//!   is shared between service instances.

pub mod config;
pub mod entities;
pub mod errors;
pub mod rate_limiter;

pub use config::{subdomain_regex, ScanConfig, DEFAULT_REQUEST_TIMEOUT};
pub use entities::*;
pub use errors::*;
pub use rate_limiter::{RateLimiter, WaitCancelled};
