//! # Event Routing
//!
//! Drains the bus for the duration of a scan:
//!
//! ```text
//! Data sources ──publish──→ Event Bus ──recv──→ route_events
//!                                                  │
//!                     ┌────────────────────────────┼──────────────────┐
//!                     ↓                            ↓                  ↓
//!                Log → tracing             SetActive → queried   NewName → discoveries
//! ```
//!
//! The loop ends when the bus is closed and drained.

use harvest_telemetry::log_discovery;
use shared_bus::{HarvestEvent, LogMessage, Severity, Subscription};
use shared_types::DiscoveryRequest;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// What one scan produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Every discovery in arrival order, duplicates included.
    pub discoveries: Vec<DiscoveryRequest>,
    /// Sources that sent at least one heartbeat.
    pub queried: BTreeSet<String>,
    /// Error-severity log events seen.
    pub failures: usize,
}

impl ScanReport {
    /// Distinct discovered names, sorted.
    pub fn unique_names(&self) -> BTreeSet<&str> {
        self.discoveries.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Consume `subscription` until the bus closes, forwarding logs to `tracing`
/// and collecting everything else into a [`ScanReport`].
pub async fn route_events(mut subscription: Subscription) -> ScanReport {
    let mut report = ScanReport::default();

    while let Some(event) = subscription.recv().await {
        match event {
            HarvestEvent::Log(message) => {
                if message.severity == Severity::Error {
                    report.failures += 1;
                }
                forward_log(&message);
            }
            HarvestEvent::SetActive { source } => {
                debug!(source = %source, "Data source active");
                report.queried.insert(source);
            }
            HarvestEvent::NewName(discovery) => {
                log_discovery!(
                    debug,
                    discovery.source.as_str(),
                    "Name discovered",
                    discovery.name,
                    discovery.domain
                );
                report.discoveries.push(discovery);
            }
        }
    }

    info!(
        discoveries = report.discoveries.len(),
        unique = report.unique_names().len(),
        queried = report.queried.len(),
        failures = report.failures,
        "Event routing finished"
    );
    report
}

fn forward_log(message: &LogMessage) {
    match message.severity {
        Severity::Info => info!(source = %message.source, "{}", message.message),
        Severity::Warn => warn!(source = %message.source, "{}", message.message),
        Severity::Error => error!(source = %message.source, "{}", message.message),
    }
}
