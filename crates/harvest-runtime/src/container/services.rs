//! # Service Container
//!
//! Holds the shared bus, the frozen scan configuration and the registry of
//! data sources for one run.

use super::ContainerError;
use crate::wiring;
use datasrcs::{all_sources, HttpClient, QueryService, ServiceRegistry};
use shared_bus::InMemoryEventBus;
use shared_types::ScanConfig;
use std::sync::Arc;
use tracing::info;

/// Everything a scan needs, built once at startup.
pub struct ServiceContainer {
    /// Configuration shared by every source, read-only after startup.
    pub config: Arc<ScanConfig>,
    /// The event bus every source publishes to.
    pub bus: Arc<InMemoryEventBus>,
    /// Registered data sources.
    pub registry: ServiceRegistry,
}

impl ServiceContainer {
    /// Build the built-in sources, keeping only those named in `only`
    /// (all of them when `only` is empty).
    pub fn new(config: ScanConfig, only: &[String]) -> Result<Self, ContainerError> {
        let config = Arc::new(config);
        let http = HttpClient::new(config.request_timeout)?;
        let sources = all_sources(&config, &http);
        Self::with_sources(config, sources, only)
    }

    /// Build a container around an explicit set of sources.
    pub fn with_sources(
        config: Arc<ScanConfig>,
        sources: Vec<Arc<dyn QueryService>>,
        only: &[String],
    ) -> Result<Self, ContainerError> {
        let registry = wiring::register_sources(sources, only)?;

        info!(
            sources = ?registry.names(),
            domains = config.domains().len(),
            "Service container ready"
        );

        Ok(Self {
            config,
            bus: Arc::new(InMemoryEventBus::new()),
            registry,
        })
    }
}
