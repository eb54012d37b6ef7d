//! crt.sh certificate transparency search.

use crate::http::{HttpClient, HttpError};
use crate::service::{QueryService, RequestContext, ServiceBase};
use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{DiscoveryRequest, ScanConfig, SourceKind};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "CrtSh";

pub const DEFAULT_BASE_URL: &str = "https://crt.sh";

/// Minimum spacing between two queries.
pub const RATE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct CertEntry {
    #[serde(default)]
    name_value: String,
}

/// Extract the unique names of a crt.sh JSON body, in first-seen order.
///
/// `name_value` may hold several newline-separated names; wildcard labels are
/// stripped. An empty body means no certificates.
fn parse_names(body: &str) -> Result<Vec<String>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<CertEntry> = serde_json::from_str(body)?;
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for entry in &entries {
        for line in entry.name_value.lines() {
            let name = line.trim().trim_start_matches("*.").to_ascii_lowercase();
            if !name.is_empty() && seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }

    Ok(names)
}

/// Searches issued certificates for names under a domain. No key needed.
pub struct CrtSh {
    base: ServiceBase,
    http: HttpClient,
    base_url: String,
}

impl CrtSh {
    pub fn new(config: Arc<ScanConfig>, http: HttpClient) -> Self {
        Self::with_base_url(config, http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        config: Arc<ScanConfig>,
        http: HttpClient,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base: ServiceBase::new(NAME, SourceKind::Cert, RATE_INTERVAL, config),
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, domain: &str) -> String {
        format!(
            "{}/?q=%25.{}&output=json",
            self.base_url.trim_end_matches('/'),
            domain
        )
    }
}

#[async_trait]
impl QueryService for CrtSh {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    async fn handle(&self, ctx: &RequestContext, req: &DiscoveryRequest) {
        let Some(scope) = self.base.begin_query(ctx, req).await else {
            return;
        };

        let url = self.url(scope.domain());
        let body = match self.http.get_text(&url, &[], scope.cancel()).await {
            Ok(body) => body,
            Err(HttpError::Cancelled) => return,
            Err(e) => {
                scope.report_failure(&url, e);
                return;
            }
        };

        match parse_names(&body) {
            Ok(names) => {
                scope.publish_names(&names);
            }
            Err(e) => scope.report_failure(&url, e),
        }
    }
}
