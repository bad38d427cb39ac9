//! Qvick backend client

pub mod attendance;
pub mod auth;
pub mod error;
pub mod notices;
pub mod pipeline;
pub mod redirect;
pub mod users;

pub use error::ClientError;
pub use pipeline::ApiRequest;
pub use redirect::{LoginRedirect, NoRedirect};

use crate::types::ApiResponse;
use qvick_core::{Session, TokenStore};
use reqwest::{Client, ClientBuilder, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How concurrent refresh attempts interact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Refreshes are serialized; a request whose rejected token was already
    /// replaced reuses the new token instead of refreshing again
    #[default]
    Coalesced,
    /// Every 401 triggers its own refresh call
    Independent,
}

/// Qvick API client
///
/// Clones share the token store and the refresh gate.
#[derive(Clone)]
pub struct QvickClient {
    client: Client,
    base_url: String,
    store: Arc<TokenStore>,
    redirect: Arc<dyn LoginRedirect>,
    refresh_policy: RefreshPolicy,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

impl QvickClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> QvickClientBuilder {
        QvickClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store backing this client
    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.store.session()
    }

    /// Refresh policy in effect
    pub const fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Unauthenticated request on the raw transport, outside the pipeline
    fn public_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send `request` through the pipeline and decode the response envelope
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode_envelope(response).await
    }

    /// Send `request` through the pipeline, discarding the response body
    pub async fn execute_empty(&self, request: &ApiRequest) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Send `request` through the pipeline and return the raw body
    pub async fn execute_bytes(&self, request: &ApiRequest) -> Result<Vec<u8>, ClientError> {
        let response = ensure_success(self.send(request).await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl std::fmt::Debug for QvickClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QvickClient")
            .field("base_url", &self.base_url)
            .field("refresh_policy", &self.refresh_policy)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Map a non-2xx response to a [`ClientError`]
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, %status, "failed to read error body");
            String::new()
        }
    };
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    Err(ClientError::from_status(status, message))
}

/// Decode the `data` member of a successful response
pub(crate) async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<T, ClientError> {
    let body = ensure_success(response).await?.bytes().await?;
    let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
    Ok(envelope.data)
}

/// Builder for QvickClient
pub struct QvickClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<TokenStore>>,
    redirect: Arc<dyn LoginRedirect>,
    refresh_policy: RefreshPolicy,
}

impl Default for QvickClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            user_agent: None,
            store: None,
            redirect: Arc::new(NoRedirect),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl QvickClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Share an existing token store instead of an in-memory one
    pub fn token_store(mut self, store: Arc<TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Hook run after a failed refresh has cleared the session
    pub fn on_login_required(mut self, redirect: impl LoginRedirect + 'static) -> Self {
        self.redirect = Arc::new(redirect);
        self
    }

    /// Set how concurrent refreshes are handled
    pub const fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<QvickClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}")))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let mut client_builder = ClientBuilder::new()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| concat!("qvick-client/", env!("CARGO_PKG_VERSION")).to_string());
        client_builder = client_builder.user_agent(user_agent);

        let client = client_builder.build()?;

        Ok(QvickClient {
            client,
            base_url,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(TokenStore::in_memory())),
            redirect: self.redirect,
            refresh_policy: self.refresh_policy,
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }
}
