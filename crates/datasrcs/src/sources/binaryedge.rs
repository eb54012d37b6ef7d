//! BinaryEdge subdomain API.

use crate::http::{HttpClient, HttpError};
use crate::service::{QueryService, RequestContext, ServiceBase};
use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{DiscoveryRequest, ScanConfig, SourceKind};
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "BinaryEdge";

/// Production endpoint prefix.
pub const DEFAULT_BASE_URL: &str = "https://api.binaryedge.io/v2/query/domains";

/// Minimum spacing between two queries.
pub const RATE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct SubdomainResponse {
    #[serde(default)]
    events: Vec<String>,
}

/// Queries BinaryEdge for names under a domain. Requires an API key.
pub struct BinaryEdge {
    base: ServiceBase,
    http: HttpClient,
    base_url: String,
}

impl BinaryEdge {
    pub fn new(config: Arc<ScanConfig>, http: HttpClient) -> Self {
        Self::with_base_url(config, http, DEFAULT_BASE_URL)
    }

    /// Point the source at another endpoint prefix.
    pub fn with_base_url(
        config: Arc<ScanConfig>,
        http: HttpClient,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base: ServiceBase::new(NAME, SourceKind::Api, RATE_INTERVAL, config).requiring_key(),
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, domain: &str) -> String {
        format!("{}/subdomain/{}", self.base_url.trim_end_matches('/'), domain)
    }
}

#[async_trait]
impl QueryService for BinaryEdge {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    async fn handle(&self, ctx: &RequestContext, req: &DiscoveryRequest) {
        let Some(scope) = self.base.begin_query(ctx, req).await else {
            return;
        };
        let Some(key) = scope.api_key() else {
            return;
        };

        let url = self.url(scope.domain());
        let headers = [
            ("X-Key", key.key.as_str()),
            ("Content-Type", "application/json"),
        ];

        let body = match self.http.get_text(&url, &headers, scope.cancel()).await {
            Ok(body) => body,
            Err(HttpError::Cancelled) => return,
            Err(e) => {
                scope.report_failure(&url, e);
                return;
            }
        };

        match serde_json::from_str::<SubdomainResponse>(&body) {
            Ok(response) => {
                scope.publish_names(&response.events);
            }
            Err(e) => scope.report_failure(&url, e),
        }
    }
}
