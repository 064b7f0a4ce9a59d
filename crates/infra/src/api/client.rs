//! API client returning envelopes
//!
//! Every call attaches the client-kind, identity and token headers, makes a
//! single attempt and turns whatever happens into an [`ApiResponse`]. Nothing
//! here returns `Err`.

use std::time::Duration;

use codetrail_domain::constants::{
    DEFAULT_FAILURE_REASON, DEFAULT_SUCCESS_REASON, HEADER_API_IDENTITY, HEADER_API_TOKEN,
    HEADER_CLIENT_KIND, HEADER_REASON,
};
use codetrail_domain::{
    ActivityInfo, ApiConfig, CodetrailError, Credentials, HealthInfo, ProfileInfo, Result,
    SolutionContextInfo, UserConfigurationInfo, VersionInfo,
};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::response::{ApiResponse, ApiStatus};
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://codealike.com/api/v2")
    pub base_url: String,
    /// Sent as the client-kind header
    pub client_kind: String,
    pub connect_timeout: Duration,
    /// Read/write timeout, fixed for every call
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
    pub proxy_url: Option<String>,
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_kind: config.client_kind.clone(),
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            accept_invalid_certs: config.accept_invalid_certs,
            proxy_url: config.proxy_url.clone(),
        }
    }
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

/// Authenticated client for the remote collection service
pub struct ApiClient {
    http_client: HttpClient,
    config: ApiClientConfig,
    credentials: RwLock<Option<Credentials>>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns `Config` for a client kind that is not a valid header value
    /// or an unusable proxy URL, and `Network`/`Internal` if the underlying
    /// HTTP client cannot be built (for example, no TLS backend).
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let client_kind = HeaderValue::from_str(&config.client_kind).map_err(|_| {
            CodetrailError::Config(format!("invalid client kind '{}'", config.client_kind))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_CLIENT_KIND, client_kind);

        let http_client = HttpClient::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .accept_invalid_certs(config.accept_invalid_certs)
            .proxy(config.proxy_url.clone())
            .build()?;

        Ok(Self { http_client, config, credentials: RwLock::new(None) })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Credentials attached to every subsequent call.
    pub fn set_credentials(&self, credentials: Option<Credentials>) {
        *self.credentials.write() = credentials;
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().clone()
    }

    /// Execute a GET request and decode a JSON payload.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        let builder = self.request(Method::GET, path, None);
        self.execute(builder, decode_json).await
    }

    /// Execute a POST request with a JSON body.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResponse<T> {
        match self.with_body(Method::POST, path, body) {
            Ok(builder) => self.execute(builder, decode_json).await,
            Err(response) => response,
        }
    }

    /// Execute a PUT request with a JSON body.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResponse<T> {
        match self.with_body(Method::PUT, path, body) {
            Ok(builder) => self.execute(builder, decode_json).await,
            Err(response) => response,
        }
    }

    /// `POST /activity`
    pub async fn post_activity(&self, activity: &ActivityInfo) -> ApiResponse<()> {
        self.send_ignoring_body(Method::POST, "/activity", activity).await
    }

    /// `POST /solution`
    pub async fn register_project(&self, solution: &SolutionContextInfo) -> ApiResponse<()> {
        self.send_ignoring_body(Method::POST, "/solution", solution).await
    }

    /// `GET /solution/{projectId}`
    pub async fn get_solution_context(&self, project_id: Uuid) -> ApiResponse<SolutionContextInfo> {
        self.get(&format!("/solution/{project_id}")).await
    }

    /// `GET /account/{username}/profile`
    pub async fn get_profile(&self, username: &str) -> ApiResponse<ProfileInfo> {
        self.get(&format!("/account/{username}/profile")).await
    }

    /// `GET /account/{username}/config`
    pub async fn get_user_configuration(
        &self,
        username: &str,
    ) -> ApiResponse<UserConfigurationInfo> {
        self.get(&format!("/account/{username}/config")).await
    }

    /// `PUT /health`
    pub async fn log_health(&self, health: &HealthInfo) -> ApiResponse<()> {
        self.send_ignoring_body(Method::PUT, "/health", health).await
    }

    /// `GET /account/{identity}/authorized`, authenticated with `credentials`
    /// rather than the stored ones.
    #[instrument(skip(self, credentials), fields(identity = %credentials.identity()))]
    pub async fn token_authenticate(&self, credentials: &Credentials) -> ApiResponse<()> {
        let path = format!("/account/{}/authorized", credentials.identity());
        let builder = self.request(Method::GET, &path, Some(credentials));
        self.execute(builder, ignore_body).await
    }

    /// `GET /version?client={client_kind}`
    pub async fn version(&self) -> ApiResponse<VersionInfo> {
        self.get(&format!("/version?client={}", self.config.client_kind)).await
    }

    async fn send_ignoring_body<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResponse<()> {
        match self.with_body(method, path, body) {
            Ok(builder) => self.execute(builder, ignore_body).await,
            Err(response) => response,
        }
    }

    fn with_body<B: Serialize, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> std::result::Result<RequestBuilder, ApiResponse<T>> {
        let json = serde_json::to_vec(body).map_err(|err| {
            warn!(path = %path, error = %err, "Failed to serialize request body");
            ApiResponse::client_error(format!("Failed to serialize body: {err}"))
        })?;
        Ok(self
            .request(method, path, None)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let stored = self.credentials.read();
        let (identity, token) = credentials
            .or(stored.as_ref())
            .map(|c| (c.identity().to_string(), c.token().to_string()))
            .unwrap_or_default();

        self.http_client
            .request(method, url)
            .header(HEADER_API_IDENTITY, identity)
            .header(HEADER_API_TOKEN, token)
    }

    async fn execute<T>(
        &self,
        builder: RequestBuilder,
        read: fn(&str) -> std::result::Result<Option<T>, String>,
    ) -> ApiResponse<T> {
        let response = match self.http_client.send(builder).await {
            Ok(response) => response,
            Err(CodetrailError::Network(message)) => {
                warn!(reason = %message, "API call could not reach the server");
                return ApiResponse::connection_problems(message);
            }
            Err(err) => {
                warn!(error = %err, "API call failed before reaching the server");
                return ApiResponse::client_error(err.to_string());
            }
        };

        let status = response.status();
        let success = status.is_success();
        let reason = response
            .headers()
            .get(HEADER_REASON)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if success { DEFAULT_SUCCESS_REASON } else { DEFAULT_FAILURE_REASON }.to_string()
            });
        let api_status = ApiStatus::Http(status.as_u16());

        if !success {
            debug!(status = status.as_u16(), reason = %reason, "API call returned failure status");
            return ApiResponse::new(api_status, reason, None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "Failed to read response body");
                return ApiResponse::client_error(format!("Failed to read response: {err}"));
            }
        };

        match read(&body) {
            Ok(payload) => ApiResponse::new(api_status, reason, payload),
            Err(message) => {
                warn!(error = %message, "Failed to parse response body");
                ApiResponse::client_error(message)
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> std::result::Result<Option<T>, String> {
    // 204/205 and empty 200s carry no payload.
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body).map(Some).map_err(|err| format!("Failed to parse response: {err}"))
}

fn ignore_body(_body: &str) -> std::result::Result<Option<()>, String> {
    Ok(None)
}
