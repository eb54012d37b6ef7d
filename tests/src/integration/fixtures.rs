//! Shared fixtures for the integration flows.

#![cfg(test)]

use std::sync::Arc;
use std::time::Duration;

use datasrcs::{HttpClient, RequestContext};
use shared_bus::{EventFilter, EventPublisher, HarvestEvent, InMemoryEventBus, Severity, Subscription};
use shared_types::{ApiKey, DiscoveryRequest, ScanConfig};

/// Scan configuration with the given domains and `(service, key)` pairs.
pub(crate) fn scan_config(domains: &[&str], keys: &[(&str, &str)]) -> Arc<ScanConfig> {
    let mut config = ScanConfig::new();
    for domain in domains {
        config.add_domain(domain).unwrap();
    }
    for (service, key) in keys {
        config.set_api_key(service, ApiKey::new(*key));
    }
    Arc::new(config)
}

pub(crate) fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(5)).unwrap()
}

/// A bus with one catch-all subscription and a context pointing at it.
pub(crate) struct Harness {
    pub bus: Arc<InMemoryEventBus>,
    pub sub: Subscription,
    pub ctx: RequestContext,
}

impl Harness {
    pub fn new(config: Arc<ScanConfig>) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe(EventFilter::all());
        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let ctx = RequestContext::new(config, publisher);
        Self { bus, sub, ctx }
    }

    /// Everything queued so far, highest priority first.
    pub fn drain(&mut self) -> Vec<HarvestEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.sub.try_recv() {
            events.push(event);
        }
        events
    }
}

pub(crate) fn discoveries(events: &[HarvestEvent]) -> Vec<DiscoveryRequest> {
    events
        .iter()
        .filter_map(|event| match event {
            HarvestEvent::NewName(req) => Some(req.clone()),
            _ => None,
        })
        .collect()
}

pub(crate) fn error_logs(events: &[HarvestEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            HarvestEvent::Log(msg) if msg.severity == Severity::Error => Some(msg.message.clone()),
            _ => None,
        })
        .collect()
}

pub(crate) fn names(events: &[HarvestEvent]) -> Vec<String> {
    discoveries(events).into_iter().map(|d| d.name).collect()
}
