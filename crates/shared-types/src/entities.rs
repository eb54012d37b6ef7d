//! # Core Domain Entities
//!
//! Defines the records exchanged between the runtime, the data source
//! services and the downstream consumers of the event bus.
//!
//! ## Clusters
//!
//! - **Discovery**: `DiscoveryRequest`, `SourceKind`
//! - **Credentials**: `ApiKey`
//! - **Lifecycle**: `ServiceState`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: DISCOVERY
// =============================================================================

/// Classification of a data source, used to tag every name it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Commercial or free intelligence API.
    Api,
    /// Certificate transparency logs.
    Cert,
    /// HTML scraping of a search engine or site.
    Scrape,
    /// Web archive crawls.
    Archive,
    /// Names originating from DNS itself (inbound lookups).
    Dns,
}

impl SourceKind {
    /// Lowercase tag as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Cert => "cert",
            Self::Scrape => "scrape",
            Self::Archive => "archive",
            Self::Dns => "dns",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name lookup travelling between the runtime and the services.
///
/// Inbound, it asks a service to enumerate `domain`. Outbound, each instance
/// is one discovered candidate `name` under `domain`, tagged with the kind and
/// identity of the service that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    /// Candidate name (equals `domain` for an inbound lookup).
    pub name: String,
    /// Root domain under enumeration.
    pub domain: String,
    /// Kind of source that produced the name.
    pub tag: SourceKind,
    /// Identity of the producing service.
    pub source: String,
}

/// Source identity used for lookups issued by the runtime itself.
pub const LOOKUP_SOURCE: &str = "DNS";

impl DiscoveryRequest {
    /// Build the inbound lookup for a root domain.
    ///
    /// The domain is normalized to lowercase without a trailing dot.
    pub fn lookup(domain: &str) -> Self {
        let domain = normalize_name(domain);
        Self {
            name: domain.clone(),
            domain,
            tag: SourceKind::Dns,
            source: LOOKUP_SOURCE.to_string(),
        }
    }

    /// Build a discovery record for `name` found under `domain`.
    pub fn discovered(
        name: impl Into<String>,
        domain: impl Into<String>,
        tag: SourceKind,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            tag,
            source: source.into(),
        }
    }
}

/// Lowercase a DNS name and strip surrounding whitespace and trailing dots.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

// =============================================================================
// CLUSTER B: CREDENTIALS
// =============================================================================

/// Credentials for one data source, as supplied by the configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Primary API key.
    #[serde(default)]
    pub key: String,
    /// Account name, for sources using basic auth.
    #[serde(default)]
    pub username: Option<String>,
    /// Account password, for sources using basic auth.
    #[serde(default)]
    pub password: Option<String>,
    /// Secondary secret or client id.
    #[serde(default)]
    pub secret: Option<String>,
}

impl ApiKey {
    /// Create a credential holding only a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// True when the primary key carries a value.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

// Secrets never reach the logs.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &redact(Some(&self.key)))
            .field("username", &self.username)
            .field("password", &redact(self.password.as_deref()))
            .field("secret", &redact(self.secret.as_deref()))
            .finish()
    }
}

fn redact(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "<redacted>",
        _ => "<empty>",
    }
}

// =============================================================================
// CLUSTER C: LIFECYCLE
// =============================================================================

/// Lifecycle state of a data source service.
///
/// `Created -> Started -> Running -> Stopped`. A service that started without
/// credentials still reaches `Running`, it simply ignores lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// Constructed, `start()` not yet called.
    Created,
    /// `start()` in progress.
    Started,
    /// Limiter and credentials configured; accepting lookups.
    Running,
    /// Shut down; lookups are ignored.
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Started => write!(f, "Started"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}
