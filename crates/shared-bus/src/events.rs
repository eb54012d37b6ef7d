//! # Harvest Events
//!
//! Defines all event types that flow through the shared bus, the topics used
//! to filter them and the priority bands they are published at.

use serde::{Deserialize, Serialize};
use shared_types::entities::DiscoveryRequest;
use std::fmt;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvestEvent {
    /// Free-text progress or failure report from a service.
    Log(LogMessage),

    /// Heartbeat: the named service is about to do outbound work.
    SetActive {
        /// Identity of the service.
        source: String,
    },

    /// A candidate name was discovered.
    NewName(DiscoveryRequest),
}

impl HarvestEvent {
    /// Convenience constructor for a log event.
    pub fn log(source: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self::Log(LogMessage {
            source: source.into(),
            severity,
            message: message.into(),
        })
    }

    /// Convenience constructor for a heartbeat.
    pub fn active(source: impl Into<String>) -> Self {
        Self::SetActive {
            source: source.into(),
        }
    }

    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Log(_) => EventTopic::Log,
            Self::SetActive { .. } => EventTopic::SetActive,
            Self::NewName(_) => EventTopic::NewName,
        }
    }

    /// Get the identity of the originating service.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Log(msg) => &msg.source,
            Self::SetActive { source } => source,
            Self::NewName(req) => &req.source,
        }
    }
}

/// A log record carried by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Identity of the service that wrote it.
    pub source: String,
    /// How serious the report is.
    pub severity: Severity,
    /// Human-readable text.
    pub message: String,
}

/// Severity of a bus log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Routine progress.
    Info,
    /// Degraded but expected (e.g. missing credentials).
    Warn,
    /// A lookup failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Delivery priority band.
///
/// Subscribers always drain queued `Critical` events before `High`, and
/// `High` before `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Liveness signals.
    Critical,
    /// Discoveries and lookup reports.
    High,
    /// Everything else.
    Normal,
}

impl Priority {
    /// Number of priority bands.
    pub const COUNT: usize = 3;

    /// All bands, highest first.
    pub const ALL: [Priority; Priority::COUNT] =
        [Priority::Critical, Priority::High, Priority::Normal];

    /// Queue index of this band (0 is drained first).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Normal => 2,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Log records.
    Log,
    /// Service heartbeats.
    SetActive,
    /// Discovered names.
    NewName,
    /// All events (no filtering).
    All,
}

impl EventTopic {
    /// Stable topic name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::SetActive => "active",
            Self::NewName => "newname",
            Self::All => "all",
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source services to include. Empty means all sources.
    pub sources: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            sources: Vec::new(),
        }
    }

    /// Create a filter for events from specific services.
    #[must_use]
    pub fn from_sources(sources: Vec<String>) -> Self {
        Self {
            topics: Vec::new(),
            sources,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &HarvestEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.sources.is_empty()
            || self.sources.iter().any(|s| s.as_str() == event.source());

        topic_match && source_match
    }
}
