//! # Data Sources
//!
//! Interchangeable services that turn a root domain into candidate subdomain
//! names. Each source:
//!
//! - resolves its credential once at start and stays inert without one when
//!   it needs one
//! - spaces its outbound queries with its own rate limiter
//! - publishes a heartbeat and a log line before every query
//! - publishes every validated name as a discovery event
//! - reports a failed query as one error log, never as a return value
//!
//! Nothing is returned synchronously; all output goes through the bus.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod http;
pub mod service;
pub mod sources;

pub use http::{HttpClient, HttpError};
pub use service::{QueryScope, QueryService, RequestContext, ServiceBase, ServiceRegistry};
pub use sources::{all_sources, BinaryEdge, CrtSh, HackerTarget};
