//! HTTP transport shared by the data sources.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// User agent sent with every provider request.
pub const USER_AGENT: &str = concat!("harvest/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the TCP/TLS handshake, independent of the request timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while fetching a provider response.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    /// The wrapped error never carries the request URL, which may hold
    /// credentials in its query string.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status {status}")]
    Status { status: u16 },
    #[error("request cancelled")]
    Cancelled,
}

/// Thin wrapper over a pooled `reqwest::Client`.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .user_agent(USER_AGENT)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self { client, timeout })
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` with extra headers and return the body as text.
    ///
    /// Any non-2xx status is an error. The request is abandoned as soon as
    /// `cancel` fires.
    pub async fn get_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<String, HttpError> {
        self.get_text_with_query(url, &[], headers, cancel).await
    }

    /// Like [`get_text`](Self::get_text), appending URL-encoded `query`
    /// pairs to `url`.
    pub async fn get_text_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<String, HttpError> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let fetch = async {
            let response = request.send().await.map_err(transport)?;
            let status = response.status();
            if !status.is_success() {
                return Err(HttpError::Status {
                    status: status.as_u16(),
                });
            }
            response.text().await.map_err(transport)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url, "HTTP request cancelled");
                Err(HttpError::Cancelled)
            }
            result = fetch => result,
        }
    }
}

fn transport(error: reqwest::Error) -> HttpError {
    HttpError::Transport(error.without_url())
}
