use std::time::Duration;

use backoffice_domain::constants::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use backoffice_domain::{BackofficeError, RequestError};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::transport_error;

/// HTTP client with a request timeout.
///
/// Sends exactly once: wrapped operations are not all idempotent (job
/// creation), so retries are left to the caller.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `BackofficeError::Config` if the TLS backend cannot start.
    pub fn new() -> Result<Self, BackofficeError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    ///
    /// # Errors
    /// Transport failures map to `NetworkFailure`, unbuildable requests to
    /// `InvalidRequest`. HTTP error statuses are returned as responses.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, RequestError> {
        let request = builder.build().map_err(|err| transport_error(&err))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, url = %redacted(&url), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, url = %redacted(&url), %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, url = %redacted(&url), error = %err, "HTTP request failed");
                Err(transport_error(&err))
            }
        }
    }
}

/// Path only; query strings may carry search terms and ids.
fn redacted(url: &reqwest::Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// # Errors
    /// Returns `BackofficeError::Config` if reqwest rejects the settings.
    pub fn build(self) -> Result<HttpClient, BackofficeError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| BackofficeError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client })
    }
}
