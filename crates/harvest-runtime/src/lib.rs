//! # Harvest Runtime
//!
//! Orchestrates one subdomain enumeration run.
//!
//! ## Modular Structure
//!
//! - `cli` - Command line arguments
//! - `container/` - Configuration layering and per-run services
//! - `wiring/` - Source registration and bus event routing
//!
//! ## Run Sequence
//!
//! 1. Resolve configuration (file, environment, flags)
//! 2. Build the bus, the HTTP client and the data sources
//! 3. Subscribe the event router before anything is published
//! 4. Start every source (missing credentials are tolerated)
//! 5. Fan one lookup per domain out to every source and wait
//! 6. Stop the sources and close the bus
//! 7. Collect the report once the router has drained the bus
//!
//! Cancelling the runtime's token (deadline or Ctrl-C) makes every pending
//! rate-limit wait and request return early; the run then finishes normally
//! with whatever was discovered so far.

pub mod cli;
pub mod container;
pub mod wiring;

use std::future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use datasrcs::RequestContext;
use harvest_telemetry::log_event;
use shared_bus::{EventFilter, EventPublisher};
use shared_types::DiscoveryRequest;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::container::{RuntimeConfig, ServiceContainer};
use crate::wiring::{route_events, ScanReport};

/// The runtime driving one scan.
pub struct HarvestRuntime {
    /// Bus, configuration and data sources.
    container: ServiceContainer,
    /// Overall scan deadline.
    deadline: Option<Duration>,
    /// Cancels every in-flight lookup.
    cancel: CancellationToken,
}

impl HarvestRuntime {
    /// Build the runtime with the built-in data sources.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let container = ServiceContainer::new(config.scan, &config.sources)
            .context("Failed to build data sources")?;
        Ok(Self::with_container(container, config.deadline))
    }

    /// Build the runtime around an existing container.
    pub fn with_container(container: ServiceContainer, deadline: Option<Duration>) -> Self {
        Self {
            container,
            deadline,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts the scan when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Run the scan to completion and return what was discovered.
    pub async fn run(&self) -> Result<ScanReport> {
        let container = &self.container;

        log_event!(
            info,
            "runtime",
            "Starting scan",
            domains = ?container.config.domains(),
            sources = ?container.registry.names()
        );

        // Subscribe before the first publish so nothing is missed.
        let router = tokio::spawn(route_events(container.bus.subscribe(EventFilter::all())));

        let running = container.registry.start_all().await;
        if running == 0 {
            warn!("No data source is running");
        }

        let bus: Arc<dyn EventPublisher> = container.bus.clone();
        let ctx = RequestContext::new(Arc::clone(&container.config), bus)
            .with_cancel(self.cancel.clone());

        let requests: Vec<DiscoveryRequest> = container
            .config
            .domains()
            .iter()
            .map(|domain| DiscoveryRequest::lookup(domain))
            .collect();

        container.registry.dispatch_all(&ctx, &requests).await;

        if self.cancel.is_cancelled() {
            warn!("Scan cancelled before every source finished");
        }

        container.registry.stop_all().await;
        container.bus.close();

        let report = router.await.context("Event router task failed")?;

        log_event!(
            info,
            "runtime",
            "Scan complete",
            discoveries = report.discoveries.len(),
            unique = report.unique_names().len(),
            failures = report.failures
        );
        Ok(report)
    }

    /// Cancel the scan. Idempotent.
    pub fn shutdown(&self) {
        info!("Initiating shutdown...");
        self.cancel.cancel();
    }
}

/// Cancel `cancel` when `deadline` elapses or Ctrl-C is pressed, whichever
/// comes first. Returns early if the token is cancelled elsewhere.
pub async fn cancel_on_shutdown(cancel: CancellationToken, deadline: Option<Duration>) {
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep(deadline).await,
            None => future::pending::<()>().await,
        }
    };

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = expired => warn!("Scan deadline reached, cancelling"),
        _ = interrupted => warn!("Interrupt received, cancelling"),
    }

    cancel.cancel();
}
