//! Durable session state.
//!
//! This module owns the three persisted session entries (`access_token`,
//! `refresh_token`, `current_user`) and the in-memory view of them. State
//! is loaded once when the store opens; afterwards memory is authoritative
//! and every mutation holds the storage lock across the backend write and
//! the state publish, so concurrent mutations commit to disk and memory in
//! the same order and readers never observe a half-applied change. The
//! state lives in a watch channel: gates read it synchronously, reactive
//! consumers subscribe to it.

pub mod storage;

use crate::auth::models::{AuthResponse, CurrentUser, UserRole};
use crate::errors::ClientResult;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

pub use storage::{FileStorage, MemoryStorage, SessionStorage};

/// Storage key for the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the serialized user.
pub const CURRENT_USER_KEY: &str = "current_user";

/// Fully populated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: CurrentUser,
}

/// Observable session state. Each entry loads and clears independently, so
/// any subset may be present.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<CurrentUser>,
}

struct Inner {
    storage: Mutex<Box<dyn SessionStorage>>,
    state: watch::Sender<SessionState>,
}

/// Shared handle over the persisted session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Opens the store over a storage backend, loading whatever it holds.
    ///
    /// Entries load independently; a value that fails to parse is treated
    /// as absent rather than an error, so a stale or corrupted entry can
    /// never block startup.
    pub fn open(storage: impl SessionStorage + 'static) -> Self {
        let access_token = storage.get(ACCESS_TOKEN_KEY);
        let refresh_token = storage.get(REFRESH_TOKEN_KEY);
        let user = storage
            .get(CURRENT_USER_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    debug!("discarding unreadable stored user: {err}");
                    None
                }
            });

        let (state, _) = watch::channel(SessionState {
            access_token,
            refresh_token,
            user,
        });

        SessionStore {
            inner: Arc::new(Inner {
                storage: Mutex::new(Box::new(storage)),
                state,
            }),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.state.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.state.borrow().refresh_token.clone()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.inner.state.borrow().user.clone()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.inner.state.borrow().user.as_ref().map(|u| u.role)
    }

    /// A user is signed in. Mirrors the presence of the stored user entry.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().user.is_some()
    }

    /// The complete session, present only when all three entries are.
    pub fn session(&self) -> Option<Session> {
        let state = self.inner.state.borrow();
        Some(Session {
            access_token: state.access_token.clone()?,
            refresh_token: state.refresh_token.clone()?,
            user: state.user.clone()?,
        })
    }

    /// Watch the session as it changes. The current value is visible
    /// immediately to new subscribers.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Replaces the whole persisted session. Login, registration and token
    /// refresh all store the same payload.
    pub fn save(&self, auth: &AuthResponse) -> ClientResult<()> {
        let user_json = serde_json::to_string(&auth.user)?;
        // The lock covers the publish too, so racing mutations commit to
        // disk and memory in the same order.
        let mut storage = lock(&self.inner.storage);
        storage.set(ACCESS_TOKEN_KEY, &auth.access_token)?;
        storage.set(REFRESH_TOKEN_KEY, &auth.refresh_token)?;
        storage.set(CURRENT_USER_KEY, &user_json)?;
        self.inner.state.send_modify(|state| {
            state.access_token = Some(auth.access_token.clone());
            state.refresh_token = Some(auth.refresh_token.clone());
            state.user = Some(auth.user.clone());
        });
        Ok(())
    }

    /// Removes every session entry and resets in-memory state.
    pub fn clear(&self) -> ClientResult<()> {
        let mut storage = lock(&self.inner.storage);
        storage.remove(ACCESS_TOKEN_KEY)?;
        storage.remove(REFRESH_TOKEN_KEY)?;
        storage.remove(CURRENT_USER_KEY)?;
        self.inner.state.send_modify(|state| {
            *state = SessionState::default();
        });
        Ok(())
    }
}

fn lock(storage: &Mutex<Box<dyn SessionStorage>>) -> MutexGuard<'_, Box<dyn SessionStorage>> {
    storage.lock().unwrap_or_else(PoisonError::into_inner)
}
