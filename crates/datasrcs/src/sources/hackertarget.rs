//! HackerTarget host search.

use crate::http::{HttpClient, HttpError};
use crate::service::{QueryService, RequestContext, ServiceBase};
use async_trait::async_trait;
use shared_types::{DiscoveryRequest, ScanConfig, SourceKind};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const NAME: &str = "HackerTarget";

pub const DEFAULT_BASE_URL: &str = "https://api.hackertarget.com";

/// Minimum spacing between two queries.
pub const RATE_INTERVAL: Duration = Duration::from_secs(1);

/// The API answers quota and input problems with a 200 and a plain-text
/// message instead of CSV.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("provider refused the query: {0}")]
struct ProviderRefusal(String);

/// Extract hostnames from `host,ip` lines.
fn parse_hosts(body: &str) -> Result<Vec<&str>, ProviderRefusal> {
    let trimmed = body.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let first_line = lowered.lines().next().unwrap_or_default();
    let is_error = first_line.starts_with("error") && !first_line.contains(',');
    if is_error || lowered.contains("api count exceeded") {
        return Err(ProviderRefusal(trimmed.to_string()));
    }

    Ok(trimmed
        .lines()
        .filter_map(|line| line.split_once(',').map(|(host, _)| host.trim()))
        .filter(|host| !host.is_empty())
        .collect())
}

/// Searches HackerTarget's passive DNS. Works without a key; a configured
/// key lifts the daily quota.
pub struct HackerTarget {
    base: ServiceBase,
    http: HttpClient,
    base_url: String,
}

impl HackerTarget {
    pub fn new(config: Arc<ScanConfig>, http: HttpClient) -> Self {
        Self::with_base_url(config, http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        config: Arc<ScanConfig>,
        http: HttpClient,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base: ServiceBase::new(NAME, SourceKind::Api, RATE_INTERVAL, config),
            http,
            base_url: base_url.into(),
        }
    }

    /// Request URL without the key, which travels as a separate query pair.
    fn url(&self, domain: &str) -> String {
        format!(
            "{}/hostsearch/?q={}",
            self.base_url.trim_end_matches('/'),
            domain
        )
    }
}

#[async_trait]
impl QueryService for HackerTarget {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    async fn handle(&self, ctx: &RequestContext, req: &DiscoveryRequest) {
        let Some(scope) = self.base.begin_query(ctx, req).await else {
            return;
        };

        let url = self.url(scope.domain());
        let query: Vec<(&str, &str)> = scope
            .api_key()
            .map(|key| ("apikey", key.key.as_str()))
            .into_iter()
            .collect();

        let body = match self
            .http
            .get_text_with_query(&url, &query, &[], scope.cancel())
            .await
        {
            Ok(body) => body,
            Err(HttpError::Cancelled) => return,
            Err(e) => {
                scope.report_failure(&url, e);
                return;
            }
        };

        match parse_hosts(&body) {
            Ok(hosts) => {
                scope.publish_names(hosts);
            }
            Err(e) => scope.report_failure(&url, e),
        }
    }
}
