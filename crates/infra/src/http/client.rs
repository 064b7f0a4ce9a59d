use std::time::Duration;

use codetrail_domain::constants::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS};
use codetrail_domain::CodetrailError;
use reqwest::{Client as ReqwestClient, Method, Proxy, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP client with fixed connect and request timeouts.
///
/// Every call is a single attempt. Retrying is left to the caller.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, CodetrailError> {
        let request = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            CodetrailError::from(infra)
        })?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                let infra: InfraError = err.into();
                Err(CodetrailError::from(infra))
            }
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    connect_timeout: Duration,
    timeout: Duration,
    default_headers: Option<reqwest::header::HeaderMap>,
    accept_invalid_certs: bool,
    proxy_url: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            default_headers: None,
            accept_invalid_certs: false,
            proxy_url: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Read/write timeout for the whole request after connecting.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Headers sent with every request.
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Skip server certificate validation.
    ///
    /// Meant for networks behind TLS-intercepting appliances. Building a
    /// client with this enabled logs a warning.
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// Route every request through `url`. Without one the client connects
    /// directly.
    pub fn proxy(mut self, url: Option<String>) -> Self {
        self.proxy_url = url;
        self
    }

    /// # Errors
    /// `Config` for an unusable proxy URL, otherwise whatever reqwest reports
    /// while assembling the client.
    pub fn build(self) -> Result<HttpClient, CodetrailError> {
        let mut builder = ReqwestClient::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout);

        builder = match &self.proxy_url {
            Some(url) => {
                let proxy = Proxy::all(url.as_str()).map_err(|err| {
                    CodetrailError::Config(format!("invalid proxy URL '{url}': {err}"))
                })?;
                debug!(proxy = %url, "HTTP client uses a proxy");
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        if self.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for this HTTP client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            CodetrailError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}
