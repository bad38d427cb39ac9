//! Authenticated request pipeline
//!
//! Each call runs a small state machine:
//!
//! ```text
//! Dispatch ──401──▶ Refreshing ──ok──▶ Retry ──▶ (final response)
//!    │                  │
//!    └─other──▶ done    └─err──▶ Failed ──▶ clear session, redirect, error
//! ```
//!
//! The retry arm has no 401 branch, so a backend that keeps answering 401
//! costs at most one refresh and one replay per request.

use super::{ClientError, QvickClient, RefreshPolicy, decode_envelope};
use crate::types::{RefreshRequest, RefreshResponse};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Replayable description of an API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Position of one request in the pipeline
#[derive(Debug)]
enum PipelineState {
    /// First attempt with whatever token the store holds
    Dispatch,
    /// First attempt was rejected; `rejected` is the token it carried
    Refreshing { rejected: Option<String> },
    /// Final attempt with a freshly issued token
    Retry { access_token: String },
    /// Refresh failed; the session is lost
    Failed(ClientError),
}

impl QvickClient {
    /// Send `request` with the stored credentials, refreshing once on 401
    ///
    /// Any response other than a first-attempt 401 is returned unchanged,
    /// including error statuses. Transport errors are returned as-is and
    /// never trigger a refresh.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut state = PipelineState::Dispatch;

        loop {
            state = match state {
                PipelineState::Dispatch => {
                    let token = self.store.access_token();
                    let response = self.dispatch(request, token.as_deref()).await?;
                    if response.status() != StatusCode::UNAUTHORIZED {
                        return Ok(response);
                    }
                    debug!(
                        method = %request.method,
                        path = %request.path,
                        "request unauthorized, refreshing access token"
                    );
                    PipelineState::Refreshing { rejected: token }
                }
                PipelineState::Refreshing { rejected } => {
                    match self.refresh_access_token(rejected.as_deref()).await {
                        Ok(access_token) => PipelineState::Retry { access_token },
                        Err(e) => PipelineState::Failed(e),
                    }
                }
                PipelineState::Retry { access_token } => {
                    return self.dispatch(request, Some(&access_token)).await;
                }
                PipelineState::Failed(error) => {
                    warn!(error = %error, "token refresh failed, clearing session");
                    self.store.clear_session();
                    self.redirect.redirect_to_login();
                    return Err(ClientError::SessionExpired(Box::new(error)));
                }
            };
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut builder = self.client.request(request.method.clone(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = access_token.is_some(),
            "dispatching request"
        );
        Ok(builder.send().await?)
    }

    /// Obtain an access token to replace `rejected`
    async fn refresh_access_token(&self, rejected: Option<&str>) -> Result<String, ClientError> {
        match self.refresh_policy {
            RefreshPolicy::Independent => self.request_new_access_token().await,
            RefreshPolicy::Coalesced => {
                let _gate = self.refresh_gate.lock().await;

                let session = self.store.session();
                if session.refresh_token.is_none() {
                    return Err(ClientError::NotAuthenticated);
                }
                if let Some(current) = session.access_token {
                    if rejected != Some(current.as_str()) {
                        debug!("access token already refreshed by a concurrent request");
                        return Ok(current);
                    }
                }

                self.request_new_access_token().await
            }
        }
    }

    /// Call the refresh endpoint on the raw transport
    async fn request_new_access_token(&self) -> Result<String, ClientError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(ClientError::NotAuthenticated)?;

        let response = self
            .public_request(Method::POST, "/auth/refresh")
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let RefreshResponse { access_token } = decode_envelope(response).await?;

        self.store.refresh_access_token(access_token.clone());
        info!("access token refreshed");
        Ok(access_token)
    }
}
