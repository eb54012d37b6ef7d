//! # Query Service Contract
//!
//! Every data source implements [`QueryService`] and is driven identically by
//! the registry: start once, receive lookups, stop once.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use datasrcs::service::{QueryService, RequestContext, ServiceBase};
//!
//! pub struct MySource { base: ServiceBase }
//!
//! #[async_trait]
//! impl QueryService for MySource {
//!     fn base(&self) -> &ServiceBase { &self.base }
//!
//!     async fn handle(&self, ctx: &RequestContext, req: &DiscoveryRequest) {
//!         let Some(scope) = self.base.begin_query(ctx, req).await else { return };
//!         // fetch, parse, then:
//!         scope.publish_names(["www.example.com"]);
//!     }
//! }
//! ```

mod base;
pub mod registry;

pub use base::{QueryScope, ServiceBase};
pub use registry::ServiceRegistry;

use async_trait::async_trait;
use shared_bus::EventPublisher;
use shared_types::{DiscoveryRequest, ScanConfig, ServiceError, ServiceState, SourceKind};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run-scoped collaborators handed to every lookup.
///
/// Both the configuration and the bus are optional. A lookup that arrives
/// without either is dropped without side effects.
#[derive(Clone, Default)]
pub struct RequestContext {
    /// Scan configuration providing the per-domain validators.
    pub config: Option<Arc<ScanConfig>>,
    /// Bus receiving every event the lookup produces.
    pub bus: Option<Arc<dyn EventPublisher>>,
    /// Cancels rate-limit waits and in-flight requests.
    pub cancel: CancellationToken,
}

impl RequestContext {
    /// Create a context with both collaborators and a fresh token.
    pub fn new(config: Arc<ScanConfig>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            config: Some(config),
            bus: Some(bus),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the configuration for this call.
    #[must_use]
    pub fn with_config(mut self, config: Arc<ScanConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the bus for this call.
    #[must_use]
    pub fn with_bus(mut self, bus: Arc<dyn EventPublisher>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Replace the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// The contract every data source implements.
///
/// Lifecycle methods have default implementations on top of
/// [`ServiceBase`]; a source only supplies its base and `handle`.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Shared lifecycle, credential and rate limiting state.
    fn base(&self) -> &ServiceBase;

    /// Service identity, e.g. `"BinaryEdge"`.
    fn name(&self) -> &'static str {
        self.base().name()
    }

    /// Classification used to tag discoveries.
    fn source_kind(&self) -> SourceKind {
        self.base().kind()
    }

    /// Current lifecycle state.
    fn state(&self) -> ServiceState {
        self.base().state()
    }

    /// Resolve credentials and configure the rate limiter.
    ///
    /// A missing credential is logged and tolerated.
    async fn start(&self) -> Result<(), ServiceError> {
        self.base().start()
    }

    /// Stop accepting lookups.
    async fn stop(&self) -> Result<(), ServiceError> {
        self.base().stop()
    }

    /// Enumerate names under `req.domain`, publishing results on the bus.
    ///
    /// Never returns an error; failures are reported as log events.
    async fn handle(&self, ctx: &RequestContext, req: &DiscoveryRequest);
}
