use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

use super::navigator::Navigator;
use super::storage::{SessionStorage, Slot};
use crate::constants::{DEFAULT_LANGUAGE, LOGIN_ROUTE};
use crate::utils::{SessionError, StorageError};

/// Authenticated account as returned by `GET /users/profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Client-held proof of authentication
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Where the session lifecycle currently stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Startup, before the persisted session has been verified
    #[default]
    Unknown,
    Anonymous,
    Authenticated,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unknown => write!(f, "unknown"),
            AuthState::Anonymous => write!(f, "anonymous"),
            AuthState::Authenticated => write!(f, "authenticated"),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AuthState,
    token: Option<String>,
    user: Option<User>,
    /// Bumped by every mutation; async completions commit only against the version they started from
    version: u64,
    disposed: bool,
}

/// Shared session state: in-memory view, durable slots and the navigation hook.
///
/// Every mutation writes storage inside the same critical section that
/// updates memory, so a restart reconstructs exactly what was last
/// committed. The lock is never held across an `.await`.
pub struct SessionContext {
    inner: Mutex<Inner>,
    storage: Box<dyn SessionStorage>,
    navigator: Box<dyn Navigator>,
    login_route: String,
}

impl SessionContext {
    pub fn new(
        storage: impl SessionStorage + 'static,
        navigator: impl Navigator + 'static,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            storage: Box::new(storage),
            navigator: Box::new(navigator),
            login_route: LOGIN_ROUTE.to_string(),
        }
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub fn state(&self) -> AuthState {
        self.inner.lock().state
    }

    pub fn token(&self) -> Option<String> {
        self.inner.lock().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.lock().user.clone()
    }

    /// Both halves of the session, or nothing
    pub fn session(&self) -> Option<Session> {
        let inner = self.inner.lock();
        match (&inner.token, &inner.user) {
            (Some(token), Some(user)) => Some(Session {
                user: user.clone(),
                token: token.clone(),
            }),
            _ => None,
        }
    }

    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state() == AuthState::Unknown
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    pub(crate) fn ensure_live(&self) -> Result<(), SessionError> {
        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        Ok(())
    }

    /// Load the persisted pair into memory. Returns the version to verify against,
    /// or `None` when there was nothing usable to restore.
    pub(crate) fn restore(&self) -> Result<Option<u64>, SessionError> {
        let mut inner = self.inner.lock();
        if inner.disposed {
            return Err(SessionError::Disposed);
        }

        let slots = self
            .storage
            .read(Slot::Token)
            .and_then(|token| Ok((token, self.storage.read(Slot::User)?)));
        let (token, user) = match slots {
            Ok(slots) => slots,
            Err(e) => {
                reset(&mut inner);
                return Err(e.into());
            }
        };

        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        match (token, user) {
            (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    debug!(user_id = user.id, "Restored persisted session");
                    inner.token = Some(token);
                    inner.user = Some(user);
                    inner.state = AuthState::Unknown;
                    inner.version += 1;
                    Ok(Some(inner.version))
                }
                Err(e) => {
                    warn!("Discarding unreadable stored user: {}", e);
                    self.wipe(&mut inner)?;
                    Ok(None)
                }
            },
            (None, None) => {
                reset(&mut inner);
                Ok(None)
            }
            _ => {
                debug!("Discarding partial persisted session");
                self.wipe(&mut inner)?;
                Ok(None)
            }
        }
    }

    /// Persist a freshly issued token. The previous user is dropped until the
    /// matching profile is committed.
    pub(crate) fn stage_token(&self, expected: u64, token: &str) -> Result<u64, SessionError> {
        let mut inner = self.inner.lock();
        check(&inner, expected)?;

        self.storage.write(Slot::Token, token)?;
        self.storage.remove(Slot::User)?;

        inner.token = Some(token.to_string());
        inner.user = None;
        inner.state = AuthState::Anonymous;
        inner.version += 1;
        Ok(inner.version)
    }

    /// Attach the verified profile to the current token
    pub(crate) fn establish(&self, expected: u64, user: User) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        check(&inner, expected)?;
        if inner.token.is_none() {
            return Err(SessionError::Superseded);
        }

        let raw = serde_json::to_string(&user).map_err(StorageError::from)?;
        self.storage.write(Slot::User, &raw)?;

        inner.user = Some(user);
        inner.state = AuthState::Authenticated;
        inner.version += 1;
        Ok(())
    }

    /// Clear only if nothing else has touched the session since `expected`
    pub(crate) fn clear_if_current(&self, expected: u64) -> Result<bool, StorageError> {
        let mut inner = self.inner.lock();
        if inner.version != expected {
            return Ok(false);
        }
        self.wipe(&mut inner)?;
        Ok(true)
    }

    /// Drop the session in memory and in storage
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.wipe(&mut inner)
    }

    /// The server rejected the token: clear everything and send the user to login
    pub(crate) fn expire(&self) {
        let result = {
            let mut inner = self.inner.lock();
            self.wipe(&mut inner)
        };
        if let Err(e) = result {
            error!("Failed to remove persisted session: {}", e);
        }
        info!("Session cleared after authentication failure");
        self.navigator.navigate(&self.login_route);
    }

    /// End of lifecycle. Storage is left alone so the next process can restore it.
    pub(crate) fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.disposed = true;
        inner.token = None;
        inner.user = None;
        inner.state = AuthState::Anonymous;
        inner.version += 1;
    }

    fn wipe(&self, inner: &mut Inner) -> Result<(), StorageError> {
        reset(inner);
        let token = self.storage.remove(Slot::Token);
        let user = self.storage.remove(Slot::User);
        token.and(user)
    }
}

fn reset(inner: &mut Inner) {
    inner.token = None;
    inner.user = None;
    inner.state = AuthState::Anonymous;
    inner.version += 1;
}

fn check(inner: &Inner, expected: u64) -> Result<(), SessionError> {
    if inner.disposed {
        return Err(SessionError::Disposed);
    }
    if inner.version != expected {
        return Err(SessionError::Superseded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::navigator::MockNavigator;
    use crate::session::storage::{MemoryStorage, MockSessionStorage};
    use mockall::predicate::eq;

    fn user() -> User {
        User {
            id: 1,
            username: "a".to_string(),
            email: "a@b.com".to_string(),
            preferred_language: "en".to_string(),
            created_at: None,
        }
    }

    fn quiet_navigator() -> MockNavigator {
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().return_const(());
        navigator
    }

    #[test]
    fn test_restore_requires_both_slots() {
        let storage = MemoryStorage::new();
        storage.write(Slot::Token, "tok1").unwrap();
        let context = SessionContext::new(storage.clone(), quiet_navigator());

        assert_eq!(context.restore().unwrap(), None);
        assert_eq!(context.state(), AuthState::Anonymous);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_restore_sets_user_optimistically() {
        let storage = MemoryStorage::new();
        storage.write(Slot::Token, "tok1\n").unwrap();
        storage
            .write(Slot::User, &serde_json::to_string(&user()).unwrap())
            .unwrap();
        let context = SessionContext::new(storage, quiet_navigator());

        let version = context.restore().unwrap();
        assert_eq!(version, Some(context.version()));
        assert!(context.is_loading());
        assert!(context.is_authenticated());
        assert_eq!(context.token().as_deref(), Some("tok1"));
    }

    #[test]
    fn test_restore_discards_corrupt_user() {
        let storage = MemoryStorage::new();
        storage.write(Slot::Token, "tok1").unwrap();
        storage.write(Slot::User, "{not json").unwrap();
        let context = SessionContext::new(storage.clone(), quiet_navigator());

        assert_eq!(context.restore().unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let context = SessionContext::new(MemoryStorage::new(), quiet_navigator());
        let started = context.version();
        let staged = context.stage_token(started, "tok1").unwrap();

        context.clear().unwrap();

        assert!(matches!(
            context.establish(staged, user()),
            Err(SessionError::Superseded)
        ));
        assert_eq!(context.session(), None);
        assert!(!context.clear_if_current(staged).unwrap());
    }

    #[test]
    fn test_expire_clears_each_slot_once_and_navigates() {
        let mut storage = MockSessionStorage::new();
        storage
            .expect_remove()
            .with(eq(Slot::Token))
            .times(1)
            .returning(|_| Ok(()));
        storage
            .expect_remove()
            .with(eq(Slot::User))
            .times(1)
            .returning(|_| Ok(()));

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/login"))
            .times(1)
            .return_const(());

        let context = SessionContext::new(storage, navigator);
        context.expire();
        assert_eq!(context.state(), AuthState::Anonymous);
    }

    #[test]
    fn test_dispose_keeps_storage() {
        let storage = MemoryStorage::new();
        let context = SessionContext::new(storage.clone(), quiet_navigator());
        let staged = context.stage_token(context.version(), "tok1").unwrap();
        context.establish(staged, user()).unwrap();

        context.dispose();

        assert!(context.is_disposed());
        assert_eq!(context.user(), None);
        assert_eq!(storage.read(Slot::Token).unwrap().as_deref(), Some("tok1"));
        assert!(matches!(context.ensure_live(), Err(SessionError::Disposed)));
    }
}
