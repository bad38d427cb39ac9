//! Authentication API client methods

use super::{ClientError, QvickClient, decode_envelope, ensure_success};
use crate::types::{SignInRequest, SignInResponse, SignUpTeacherRequest};
use qvick_core::Role;
use reqwest::Method;
use tracing::info;

impl QvickClient {
    /// Sign in and store the issued session
    ///
    /// Sign-in uses the raw transport, so a 401 here means bad credentials
    /// and never triggers a refresh. Accounts whose role cannot use the
    /// dashboard are rejected without touching the token store.
    pub async fn sign_in(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Role, ClientError> {
        let response = self
            .public_request(Method::POST, "/auth/sign-in")
            .json(&SignInRequest {
                email: email.into(),
                password: password.into(),
            })
            .send()
            .await?;
        let SignInResponse {
            access_token,
            refresh_token,
            user_role,
        } = decode_envelope(response).await?;

        if !user_role.can_use_dashboard() {
            return Err(ClientError::Forbidden(format!(
                "role {user_role} cannot sign in to the dashboard"
            )));
        }

        self.store.set_session(access_token, refresh_token, user_role);
        info!(role = %user_role, "signed in");
        Ok(user_role)
    }

    /// Register a supervisor account
    pub async fn sign_up_teacher(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<(), ClientError> {
        let response = self
            .public_request(Method::POST, "/auth/sign-up/teacher")
            .json(&SignUpTeacherRequest::new(name, email, password))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Forget the local session; the backend keeps no sign-out state
    pub fn sign_out(&self) {
        self.store.clear_session();
        info!("signed out");
    }
}
