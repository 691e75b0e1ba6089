//! Client-held session: tokens and the signed-in user.
//!
//! Views never read credentials from a global. They receive a
//! [`SessionContext`] and ask it for the session, and the network layer
//! reports 401s back through the same context.

use crate::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

/// Route protected views redirect to without a session.
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: String,
}

impl User {
    /// Name if set, otherwise the email address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Tokens plus user record, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid stored user: {0}")]
    InvalidUser(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Access to the current session.
#[cfg(not(target_arch = "wasm32"))]
pub trait SessionContext: Send + Sync {
    fn get_session(&self) -> Option<Session>;

    /// Called by the network layer on a 401 response.
    fn on_unauthorized(&self);

    fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }
}

/// Access to the current session (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait SessionContext {
    fn get_session(&self) -> Option<Session>;

    /// Called by the network layer on a 401 response.
    fn on_unauthorized(&self);

    fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }
}

/// Hook run after credentials were cleared by a 401.
pub type UnauthorizedHook = Box<dyn Fn() + Send + Sync>;

/// Session persisted in a key/value store under three keys.
pub struct SessionStore<S: KeyValueStore> {
    store: S,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            on_unauthorized: None,
        }
    }

    /// Run `hook` whenever a 401 clears the session (e.g. show the login view).
    pub fn with_unauthorized_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Box::new(hook));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&self, session: &Session) -> SessionResult<()> {
        let user = serde_json::to_string(&session.user)?;
        self.store.set(ACCESS_TOKEN_KEY, &session.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &session.refresh_token)?;
        self.store.set(USER_KEY, &user)?;
        log::debug!("Saved session for {}", session.user.email);
        Ok(())
    }

    /// Load the session. All three keys must be present and non-empty.
    pub fn load(&self) -> SessionResult<Option<Session>> {
        let access_token = self.store.get(ACCESS_TOKEN_KEY)?;
        let refresh_token = self.store.get(REFRESH_TOKEN_KEY)?;
        let user = self.store.get(USER_KEY)?;
        match (access_token, refresh_token, user) {
            (Some(access_token), Some(refresh_token), Some(user))
                if !access_token.is_empty() && !refresh_token.is_empty() && !user.is_empty() =>
            {
                let user = serde_json::from_str(&user)?;
                Ok(Some(Session {
                    access_token,
                    refresh_token,
                    user,
                }))
            }
            _ => Ok(None),
        }
    }

    pub fn clear(&self) -> SessionResult<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }

    /// Replace the access token after a refresh.
    pub fn set_access_token(&self, token: &str) -> SessionResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, token)?;
        Ok(())
    }
}

impl<S: KeyValueStore> SessionContext for SessionStore<S> {
    fn get_session(&self) -> Option<Session> {
        match self.load() {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Failed to load session: {}", e);
                None
            }
        }
    }

    fn on_unauthorized(&self) {
        log::warn!("Unauthorized, clearing session");
        if let Err(e) = self.clear() {
            log::warn!("Failed to clear session: {}", e);
        }
        if let Some(hook) = &self.on_unauthorized {
            hook();
        }
    }
}

impl<S: KeyValueStore + std::fmt::Debug> std::fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("store", &self.store)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

/// Redirect to the login route, remembering where the user was going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Login required")]
pub struct LoginRedirect {
    pub route: &'static str,
    pub return_to: Option<String>,
}

/// Gate for protected views.
pub fn require_session(
    context: &dyn SessionContext,
    return_to: Option<&str>,
) -> Result<Session, LoginRedirect> {
    context.get_session().ok_or_else(|| LoginRedirect {
        route: LOGIN_ROUTE,
        return_to: return_to.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            user: User {
                id: "u1".to_string(),
                email: "ada@example.com".to_string(),
                name: None,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
        }
    }

    #[test]
    fn test_save_and_load() {
        let sessions = SessionStore::new(MemoryStore::new());
        assert!(!sessions.is_logged_in());
        sessions.save(&session()).unwrap();
        assert!(sessions.is_logged_in());
        assert_eq!(sessions.get_session(), Some(session()));
        assert_eq!(
            sessions.store().get(USER_KEY).unwrap().as_deref(),
            Some(r#"{"id":"u1","email":"ada@example.com","created_at":"2024-01-01T00:00:00Z"}"#)
        );
    }

    #[test]
    fn test_all_three_keys_required() {
        let sessions = SessionStore::new(MemoryStore::new());
        sessions.save(&session()).unwrap();
        sessions.store().remove(REFRESH_TOKEN_KEY).unwrap();
        assert!(!sessions.is_logged_in());
        assert!(sessions.get_session().is_none());
    }

    #[test]
    fn test_corrupt_user_is_logged_out() {
        let sessions = SessionStore::new(MemoryStore::new());
        sessions.save(&session()).unwrap();
        sessions.store().set(USER_KEY, "{broken").unwrap();
        assert!(matches!(sessions.load(), Err(SessionError::InvalidUser(_))));
        assert!(sessions.get_session().is_none());
    }

    #[test]
    fn test_unauthorized_clears_and_notifies() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook_calls = calls.clone();
        let sessions = SessionStore::new(MemoryStore::new())
            .with_unauthorized_hook(move || {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            });
        sessions.save(&session()).unwrap();

        sessions.on_unauthorized();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sessions.store().is_empty());
    }

    #[test]
    fn test_require_session() {
        let sessions = SessionStore::new(MemoryStore::new());
        let redirect = require_session(&sessions, Some("/graph")).unwrap_err();
        assert_eq!(redirect.route, LOGIN_ROUTE);
        assert_eq!(redirect.return_to.as_deref(), Some("/graph"));

        sessions.save(&session()).unwrap();
        assert_eq!(require_session(&sessions, None).unwrap().user.id, "u1");
    }

    #[test]
    fn test_refresh_replaces_access_token() {
        let sessions = SessionStore::new(MemoryStore::new());
        sessions.save(&session()).unwrap();
        sessions.set_access_token("fresh").unwrap();
        assert_eq!(sessions.access_token().as_deref(), Some("fresh"));
        assert_eq!(sessions.get_session().unwrap().refresh_token, "refresh");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user = session().user;
        assert_eq!(user.display_name(), "ada@example.com");
        user.name = Some("Ada".to_string());
        assert_eq!(user.display_name(), "Ada");
    }
}
