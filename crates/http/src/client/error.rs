//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, timeout or request construction error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflicting resource (e.g. e-mail already registered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No session to refresh
    #[error("Not signed in")]
    NotAuthenticated,

    /// The silent refresh failed; the session has been cleared
    #[error("Session expired: {0}")]
    SessionExpired(#[source] Box<ClientError>),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the caller has to sign in again
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::NotAuthenticated)
    }

    /// Whether the request hit the client timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }

    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) => Some(409),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        let err = |code| ClientError::from_status(StatusCode::from_u16(code).unwrap(), "m".into());

        assert!(matches!(err(400), ClientError::BadRequest(_)));
        assert!(matches!(err(401), ClientError::AuthenticationFailed(_)));
        assert!(matches!(err(403), ClientError::Forbidden(_)));
        assert!(matches!(err(404), ClientError::NotFound(_)));
        assert!(matches!(err(409), ClientError::Conflict(_)));
        assert!(matches!(
            err(503),
            ClientError::ServerError { status: 503, .. }
        ));
        assert_eq!(err(409).status(), Some(409));
    }

    #[test]
    fn test_session_expired_helpers() {
        let expired = ClientError::SessionExpired(Box::new(ClientError::AuthenticationFailed(
            "refresh rejected".into(),
        )));
        assert!(expired.is_session_expired());
        assert!(ClientError::NotAuthenticated.is_session_expired());
        assert!(!ClientError::NotFound("x".into()).is_session_expired());
        assert!(expired.to_string().contains("refresh rejected"));
    }
}
