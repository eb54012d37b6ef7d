//! # Service Registry - Source Lifecycle and Fan-Out
//!
//! Holds every registered data source and drives them as a group.
//!
//! ## Features
//!
//! - **Graceful degradation**: a source that fails to start is logged and
//!   skipped, the rest of the scan continues
//! - **Fan-out**: one lookup is handed to every source concurrently
//! - **Panic isolation**: a panicking source task is logged, never propagated
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = ServiceRegistry::new();
//! registry.register(Arc::new(BinaryEdge::new(config.clone(), http.clone())));
//!
//! registry.start_all().await;
//! registry.dispatch_all(&ctx, &[DiscoveryRequest::lookup("example.com")]).await;
//! registry.stop_all().await;
//! ```

use super::{QueryService, RequestContext};
use shared_types::{DiscoveryRequest, ServiceState};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Ordered collection of data sources.
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<dyn QueryService>>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any source with the same name.
    pub fn register(&mut self, service: Arc<dyn QueryService>) {
        let name = service.name();
        info!("[Registry] Registering data source {}", name);

        if let Some(slot) = self.services.iter_mut().find(|s| s.name() == name) {
            warn!("[Registry] Data source {} already registered, replacing", name);
            *slot = service;
        } else {
            self.services.push(service);
        }
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Names of all registered sources, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Look up a source by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<Arc<dyn QueryService>> {
        self.services
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Lifecycle state of a registered source.
    pub fn state(&self, name: &str) -> Option<ServiceState> {
        self.get(name).map(|s| s.state())
    }

    /// Start every source. Returns how many reached `Running`.
    pub async fn start_all(&self) -> usize {
        info!("[Registry] Starting {} data sources", self.services.len());

        let mut running = 0;
        for service in &self.services {
            match service.start().await {
                Ok(()) => {
                    running += 1;
                    info!("[Registry] ✓ {} started", service.name());
                }
                Err(e) => {
                    warn!("[Registry] ✗ {} failed to start: {}", service.name(), e);
                }
            }
        }

        info!("[Registry] {}/{} data sources running", running, self.services.len());
        running
    }

    /// Stop every source in reverse registration order.
    pub async fn stop_all(&self) {
        info!("[Registry] Stopping all data sources");

        for service in self.services.iter().rev() {
            if let Err(e) = service.stop().await {
                error!("[Registry] ✗ {} failed to stop cleanly: {}", service.name(), e);
            }
        }

        info!("[Registry] All data sources stopped");
    }

    /// Hand one lookup to every source and wait for all of them.
    pub async fn dispatch(&self, ctx: &RequestContext, req: &DiscoveryRequest) {
        self.dispatch_all(ctx, std::slice::from_ref(req)).await;
    }

    /// Hand every lookup to every source concurrently and wait for all of
    /// them to finish.
    pub async fn dispatch_all(&self, ctx: &RequestContext, requests: &[DiscoveryRequest]) {
        let mut tasks = JoinSet::new();

        for req in requests {
            for service in &self.services {
                let service = Arc::clone(service);
                let ctx = ctx.clone();
                let req = req.clone();
                tasks.spawn(async move {
                    service.handle(&ctx, &req).await;
                });
            }
        }

        info!(
            "[Registry] Dispatched {} lookups to {} data sources",
            requests.len(),
            self.services.len()
        );

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("[Registry] Data source task failed: {}", e);
            }
        }
    }
}
