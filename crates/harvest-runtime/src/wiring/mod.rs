//! # Wiring
//!
//! Connects data sources to the registry and bus events to their consumers.

pub mod event_routing;

pub use event_routing::{route_events, ScanReport};

use crate::container::ContainerError;
use datasrcs::{QueryService, ServiceRegistry};
use std::sync::Arc;
use tracing::debug;

/// Register `sources`, keeping only those named in `only` (case-insensitive).
///
/// An empty `only` keeps every source. A name in `only` that matches no
/// source is an error.
pub fn register_sources(
    sources: Vec<Arc<dyn QueryService>>,
    only: &[String],
) -> Result<ServiceRegistry, ContainerError> {
    if let Some(unknown) = only
        .iter()
        .find(|wanted| !sources.iter().any(|s| s.name().eq_ignore_ascii_case(wanted)))
    {
        return Err(ContainerError::UnknownSource(unknown.clone()));
    }

    let mut registry = ServiceRegistry::new();
    for source in sources {
        let selected =
            only.is_empty() || only.iter().any(|w| source.name().eq_ignore_ascii_case(w));
        if selected {
            registry.register(source);
        } else {
            debug!(source = source.name(), "Data source not selected");
        }
    }

    Ok(registry)
}
