//! Token store: the single owner of session credentials

use crate::session::{PersistedSession, Role, Session};
use crate::storage::{KeyValueStore, MemoryStore};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Session credentials shared between the request pipeline and callers
///
/// Every mutation is written through to the backing [`KeyValueStore`] while
/// the write lock is held, so the durable record always matches the latest
/// in-memory state. Persistence is best-effort: failures are logged and the
/// in-memory session stays authoritative.
pub struct TokenStore {
    session: RwLock<Session>,
    storage: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    /// Rehydrate the session from `storage`
    ///
    /// A missing, unreadable or unparsable record yields an empty session.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let session = load_session(storage.as_ref());
        debug!(authenticated = session.is_authenticated(), "token store opened");
        Self {
            session: RwLock::new(session),
            storage,
        }
    }

    /// Empty store that persists nothing beyond the process
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()))
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.read().clone()
    }

    /// Current access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    /// Whether a complete session is established
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Replace the whole session after a sign-in
    pub fn set_session(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        role: Role,
    ) {
        let mut session = self.write();
        *session = Session::new(access_token, refresh_token, role);
        self.persist(&session);
        info!(%role, "session established");
    }

    /// Forget all credentials
    pub fn clear_session(&self) {
        let mut session = self.write();
        let was_authenticated = session.is_authenticated();
        *session = Session::default();
        self.persist(&session);
        if was_authenticated {
            info!("session cleared");
        }
    }

    /// Swap in a refreshed access token, keeping the refresh token and role
    ///
    /// Ignored when no session is established.
    pub fn refresh_access_token(&self, access_token: impl Into<String>) {
        let mut session = self.write();
        if session.refresh_token.is_none() {
            debug!("ignoring refreshed access token without an established session");
            return;
        }
        session.access_token = Some(access_token.into());
        self.persist(&session);
        debug!("access token refreshed");
    }

    fn persist(&self, session: &Session) {
        let record = PersistedSession::from(session);
        let result = serde_json::to_string(&record)
            .map_err(crate::CoreError::from)
            .and_then(|json| self.storage.set(PersistedSession::STORAGE_KEY, &json));

        if let Err(e) = result {
            warn!(error = %e, "failed to persist session");
        }
    }

    // A panic while holding the lock cannot leave a torn Session (every
    // mutation is a single assignment), so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("session", &*self.read())
            .finish_non_exhaustive()
    }
}

fn load_session(storage: &dyn KeyValueStore) -> Session {
    let raw = match storage.get(PersistedSession::STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Session::default(),
        Err(e) => {
            warn!(error = %e, "failed to read persisted session");
            return Session::default();
        }
    };

    match serde_json::from_str::<PersistedSession>(&raw) {
        Ok(record) => record.into_session(),
        Err(e) => {
            warn!(error = %e, "discarding unreadable persisted session");
            Session::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreError, CoreResult};
    use mockall::mock;

    mock! {
        pub Storage {}

        impl KeyValueStore for Storage {
            fn get(&self, key: &str) -> CoreResult<Option<String>>;
            fn set(&self, key: &str, value: &str) -> CoreResult<()>;
            fn remove(&self, key: &str) -> CoreResult<()>;
        }
    }

    fn stored(storage: &MemoryStore) -> PersistedSession {
        let raw = storage
            .get(PersistedSession::STORAGE_KEY)
            .unwrap()
            .expect("record should be persisted");
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_set_session_is_atomic() {
        let store = TokenStore::in_memory();
        store.set_session("tok1", "ref1", Role::Admin);

        let session = store.session();
        assert_eq!(session, Session::new("tok1", "ref1", Role::Admin));
        assert_eq!(session.access_token.as_deref(), Some("tok1"));
        assert_eq!(session.refresh_token.as_deref(), Some("ref1"));
        assert_eq!(session.role, Some(Role::Admin));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_set_session_overwrites() {
        let store = TokenStore::in_memory();
        store.set_session("a1", "r1", Role::Admin);
        store.set_session("a2", "r2", Role::Teacher);

        assert_eq!(store.session(), Session::new("a2", "r2", Role::Teacher));
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let store = TokenStore::in_memory();
        store.set_session("tok1", "ref1", Role::Teacher);

        store.clear_session();
        let once = store.session();
        store.clear_session();
        let twice = store.session();

        assert_eq!(once, Session::default());
        assert_eq!(once, twice);
        assert!(!twice.is_authenticated());
    }

    #[test]
    fn test_refresh_preserves_identity() {
        let store = TokenStore::in_memory();
        store.set_session("tok1", "ref1", Role::Admin);
        store.refresh_access_token("tok2");

        assert_eq!(store.session(), Session::new("tok2", "ref1", Role::Admin));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_refresh_without_session_is_ignored() {
        let store = TokenStore::in_memory();
        store.refresh_access_token("tok2");

        assert_eq!(store.session(), Session::default());
        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let storage = Arc::new(MemoryStore::new());
        let store = TokenStore::open(storage.clone());

        store.set_session("tok1", "ref1", Role::Admin);
        assert_eq!(
            stored(&storage),
            PersistedSession {
                access_token: Some("tok1".into()),
                refresh_token: Some("ref1".into()),
                user_role: Some("ADMIN".into()),
                is_authenticated: true,
            }
        );

        store.refresh_access_token("tok2");
        assert_eq!(stored(&storage).access_token.as_deref(), Some("tok2"));

        store.clear_session();
        assert_eq!(stored(&storage), PersistedSession::default());
    }

    #[test]
    fn test_open_rehydrates_previous_session() {
        let storage = Arc::new(MemoryStore::new());
        TokenStore::open(storage.clone()).set_session("tok1", "ref1", Role::Teacher);

        let reopened = TokenStore::open(storage);
        assert_eq!(reopened.session(), Session::new("tok1", "ref1", Role::Teacher));
    }

    #[test]
    fn test_open_with_corrupt_record_starts_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(PersistedSession::STORAGE_KEY, "not json at all")
            .unwrap();

        let store = TokenStore::open(storage);
        assert_eq!(store.session(), Session::default());
    }

    #[test]
    fn test_persistence_failure_is_not_surfaced() {
        let mut storage = MockStorage::new();
        storage
            .expect_get()
            .returning(|_| Err(CoreError::internal_error("unavailable")));
        storage
            .expect_set()
            .times(2)
            .returning(|_, _| Err(CoreError::internal_error("disk full")));

        let store = TokenStore::open(Arc::new(storage));
        assert!(!store.is_authenticated());

        store.set_session("tok1", "ref1", Role::Admin);
        assert_eq!(store.session(), Session::new("tok1", "ref1", Role::Admin));

        store.clear_session();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_session() {
        let store = Arc::new(TokenStore::in_memory());

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    store.set_session(format!("a{i}"), format!("r{i}"), Role::Admin);
                    store.clear_session();
                }
            })
        };

        for _ in 0..200 {
            let session = store.session();
            assert_eq!(
                session.access_token.is_some(),
                session.refresh_token.is_some()
            );
            if let (Some(a), Some(r)) = (&session.access_token, &session.refresh_token) {
                assert_eq!(&a[1..], &r[1..]);
            }
        }

        writer.join().unwrap();
    }
}
