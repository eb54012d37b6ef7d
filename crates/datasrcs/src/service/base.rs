//! Lifecycle, credential and dispatch state shared by every source.

use super::RequestContext;
use parking_lot::RwLock;
use regex::Regex;
use shared_bus::{EventPublisher, HarvestEvent, Priority, Severity};
use shared_types::{
    normalize_name, ApiKey, DiscoveryRequest, RateLimiter, ScanConfig, ServiceError,
    ServiceState, SourceKind,
};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// State every source embeds.
///
/// Owns the source's rate limiter and cached credential. The process-wide
/// configuration is only read, once, during `start()`.
pub struct ServiceBase {
    name: &'static str,
    kind: SourceKind,
    requires_key: bool,
    interval: Duration,
    config: Arc<ScanConfig>,
    state: RwLock<ServiceState>,
    api_key: RwLock<Option<ApiKey>>,
    limiter: RateLimiter,
}

impl ServiceBase {
    /// Create the base for a source.
    ///
    /// `interval` is the minimum spacing between two outbound queries and is
    /// applied to the limiter on `start()`.
    pub fn new(
        name: &'static str,
        kind: SourceKind,
        interval: Duration,
        config: Arc<ScanConfig>,
    ) -> Self {
        Self {
            name,
            kind,
            requires_key: false,
            interval,
            config,
            state: RwLock::new(ServiceState::Created),
            api_key: RwLock::new(None),
            limiter: RateLimiter::unlimited(),
        }
    }

    /// Refuse lookups unless a credential was found at start.
    #[must_use]
    pub fn requiring_key(mut self) -> Self {
        self.requires_key = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Whether the source cannot query without a credential.
    pub fn requires_key(&self) -> bool {
        self.requires_key
    }

    /// Credential resolved at start, if any.
    pub fn api_key(&self) -> Option<ApiKey> {
        self.api_key.read().clone()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Move `Created -> Started -> Running`.
    ///
    /// Calling it again on a started service is a no-op. A stopped service
    /// cannot be restarted.
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut state = self.state.write();
        match *state {
            ServiceState::Started | ServiceState::Running => return Ok(()),
            ServiceState::Stopped => {
                return Err(ServiceError::Stopped {
                    service: self.name.to_string(),
                })
            }
            ServiceState::Created => {}
        }
        *state = ServiceState::Started;

        let key = self
            .config
            .api_key(self.name)
            .filter(|key| key.is_configured())
            .cloned();

        if key.is_none() && self.requires_key {
            warn!(source = self.name, "API key data was not provided");
        }
        let has_key = key.is_some();
        *self.api_key.write() = key;

        self.limiter.set_interval(self.interval);
        *state = ServiceState::Running;

        info!(
            source = self.name,
            kind = self.kind.as_str(),
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            has_key,
            "Data source started"
        );
        Ok(())
    }

    /// Move to `Stopped`. Stopping twice is a no-op.
    pub fn stop(&self) -> Result<(), ServiceError> {
        let mut state = self.state.write();
        if *state != ServiceState::Stopped {
            *state = ServiceState::Stopped;
            info!(source = self.name, "Data source stopped");
        }
        Ok(())
    }

    /// Run the common pre-query steps of a lookup.
    ///
    /// Returns `None`, having published nothing, when the service is not
    /// running, lacks a required credential, the context is missing the
    /// config or the bus, the domain is out of scope, or the rate-limit wait
    /// was cancelled. Otherwise the heartbeat and the "Querying" log have been
    /// published and the caller may perform exactly one outbound query.
    pub async fn begin_query<'a>(
        &'a self,
        ctx: &'a RequestContext,
        req: &DiscoveryRequest,
    ) -> Option<QueryScope<'a>> {
        if self.state() != ServiceState::Running {
            debug!(source = self.name, state = %self.state(), "Lookup ignored");
            return None;
        }

        let api_key = self.api_key();
        if self.requires_key && api_key.is_none() {
            return None;
        }

        let config = ctx.config.as_ref()?;
        let bus = ctx.bus.as_ref()?;

        let Some(validator) = config.domain_regex(&normalize_name(&req.domain)) else {
            debug!(source = self.name, domain = %req.domain, "Domain not in scope");
            return None;
        };

        if self.limiter.wait(&ctx.cancel).await.is_err() {
            debug!(source = self.name, domain = %req.domain, "Lookup cancelled while rate limited");
            return None;
        }

        bus.publish(Priority::Critical, HarvestEvent::active(self.name));
        bus.publish(
            Priority::High,
            HarvestEvent::log(
                self.name,
                Severity::Info,
                format!("Querying {} for {} subdomains", self.name, req.domain),
            ),
        );

        Some(QueryScope {
            source: self.name,
            kind: self.kind,
            domain: req.domain.clone(),
            api_key,
            validator,
            bus,
            cancel: &ctx.cancel,
        })
    }
}

/// An admitted lookup: the rate-limit slot has been taken.
pub struct QueryScope<'a> {
    source: &'static str,
    kind: SourceKind,
    domain: String,
    api_key: Option<ApiKey>,
    validator: &'a Regex,
    bus: &'a Arc<dyn EventPublisher>,
    cancel: &'a CancellationToken,
}

impl QueryScope<'_> {
    /// Root domain under enumeration.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Credential resolved at start.
    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn cancel(&self) -> &CancellationToken {
        self.cancel
    }

    /// Publish every candidate that passes the domain validator.
    ///
    /// Candidates are normalized first. Stops early if the lookup is
    /// cancelled. Returns the number of discoveries published.
    pub fn publish_names<I, S>(&self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut published = 0;
        for candidate in candidates {
            if self.cancel.is_cancelled() {
                debug!(source = self.source, published, "Publishing stopped by cancellation");
                break;
            }

            let name = normalize_name(candidate.as_ref());
            if name.is_empty() || !self.validator.is_match(&name) {
                continue;
            }

            self.bus.publish(
                Priority::High,
                HarvestEvent::NewName(DiscoveryRequest::discovered(
                    name,
                    self.domain.clone(),
                    self.kind,
                    self.source,
                )),
            );
            published += 1;
        }

        debug!(source = self.source, domain = %self.domain, published, "Lookup complete");
        published
    }

    /// Publish the single error log for a failed lookup.
    pub fn report_failure(&self, url: &str, reason: impl Display) {
        self.bus.publish(
            Priority::High,
            HarvestEvent::log(
                self.source,
                Severity::Error,
                format!("{}: {}: {}", self.source, url, reason),
            ),
        );
    }
}
