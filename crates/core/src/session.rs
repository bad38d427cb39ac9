//! Session state held by the token store and its persisted form

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization tier of the signed-in principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Dormitory resident
    User,
    /// Dormitory supervisor
    Teacher,
    /// Service administrator
    Admin,
}

impl Role {
    /// Wire name of the role
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Teacher => "TEACHER",
            Self::Admin => "ADMIN",
        }
    }

    /// Only supervisors and administrators may sign in to the dashboard
    pub const fn can_use_dashboard(self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "TEACHER" => Ok(Self::Teacher),
            "ADMIN" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Current authentication state of this client
///
/// Tokens are opaque. A session is authenticated only while both tokens are
/// present; [`crate::TokenStore`] is the only writer.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub role: Option<Role>,
}

impl Session {
    /// Session populated by a sign-in
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            role: Some(role),
        }
    }

    /// Whether both tokens are present
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}

// Tokens are credentials; keep them out of logs and panic messages.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("is_authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Durable record layout written under [`PersistedSession::STORAGE_KEY`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl PersistedSession {
    /// Storage key of the persisted session record
    pub const STORAGE_KEY: &'static str = "token-storage";

    /// Rebuild the in-memory session
    ///
    /// The authenticated flag is derived from the tokens rather than trusted,
    /// and a role left behind without tokens is dropped.
    pub fn into_session(self) -> Session {
        let mut session = Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            role: self.user_role.as_deref().and_then(|r| r.parse().ok()),
        };

        if session.access_token.is_none() && session.refresh_token.is_none() {
            session.role = None;
        }

        session
    }
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            user_role: session.role.map(|r| r.as_str().to_string()),
            is_authenticated: session.is_authenticated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("ADMIN"));
        assert_eq!(
            serde_json::from_value::<Role>(json!("TEACHER")).unwrap(),
            Role::Teacher
        );
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_dashboard_access() {
        assert!(Role::Admin.can_use_dashboard());
        assert!(Role::Teacher.can_use_dashboard());
        assert!(!Role::User.can_use_dashboard());
    }

    #[test]
    fn test_session_authenticated_requires_both_tokens() {
        assert!(!Session::default().is_authenticated());
        assert!(Session::new("a", "r", Role::Admin).is_authenticated());

        let half = Session {
            access_token: Some("a".into()),
            refresh_token: None,
            role: Some(Role::Admin),
        };
        assert!(!half.is_authenticated());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", Session::new("secret-access", "secret-refresh", Role::Teacher));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
        assert!(rendered.contains("Teacher"));
    }

    #[test]
    fn test_persisted_layout() {
        let record = PersistedSession::from(&Session::new("tok1", "ref1", Role::Admin));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "accessToken": "tok1",
                "refreshToken": "ref1",
                "userRole": "ADMIN",
                "isAuthenticated": true,
            })
        );
    }

    #[test]
    fn test_persisted_flag_is_not_trusted() {
        let record: PersistedSession = serde_json::from_value(json!({
            "accessToken": null,
            "refreshToken": null,
            "userRole": "ADMIN",
            "isAuthenticated": true,
        }))
        .unwrap();

        let session = record.into_session();
        assert!(!session.is_authenticated());
        assert_eq!(session.role, None);
    }

    #[test]
    fn test_persisted_unknown_role_is_dropped() {
        let record: PersistedSession = serde_json::from_value(json!({
            "accessToken": "a",
            "refreshToken": "r",
            "userRole": "JANITOR",
        }))
        .unwrap();

        let session = record.into_session();
        assert!(session.is_authenticated());
        assert_eq!(session.role, None);
    }
}
