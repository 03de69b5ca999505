//! Explicit session state.
//!
//! Components that need to know who is signed in receive a [Session] rather
//! than reading any global state. The application root owns the session and
//! updates it when authentication changes; interested components hold a
//! [SessionEvents] subscription and are told about every change.
use crate::{
    error::{Error, Result},
    record::UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// The identity of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: String,
}

/// Delivered to subscribers whenever the signed-in user changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Changed(Option<UserIdentity>),
}

/// A handle to the current authentication state. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Session {
    tx: Arc<watch::Sender<Option<UserIdentity>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Session {
    /// A session with nobody signed in
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// A session with `user` already signed in
    pub fn signed_in(user: UserIdentity) -> Self {
        Self::new(Some(user))
    }

    fn new(user: Option<UserIdentity>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { tx: Arc::new(tx) }
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.tx.borrow().clone()
    }

    /// Get the current user, or fail with [Error::Unauthorized] naming the
    /// action that was attempted
    pub fn require_user(&self, action: &str) -> Result<UserIdentity> {
        self.current_user()
            .ok_or_else(|| Error::Unauthorized(action.to_string()))
    }

    pub fn sign_in(&self, user: UserIdentity) {
        self.set(Some(user))
    }

    pub fn sign_out(&self) {
        self.set(None)
    }

    fn set(&self, user: Option<UserIdentity>) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == user {
                return false;
            }
            *current = user.clone();
            true
        });
        if changed {
            debug!(user = ?user.as_ref().map(|u| &u.username), "session changed");
        }
    }

    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents {
            rx: self.tx.subscribe(),
        }
    }
}

/// A subscription to [SessionEvent]s
#[derive(Debug)]
pub struct SessionEvents {
    rx: watch::Receiver<Option<UserIdentity>>,
}

impl SessionEvents {
    /// Wait for the next change. Returns `None` once every [Session] handle
    /// has been dropped.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.changed().await.ok()?;
        Some(SessionEvent::Changed(self.rx.borrow_and_update().clone()))
    }

    /// Whether a change has happened that hasn't been received yet
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
