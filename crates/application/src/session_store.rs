//! Process-wide holder of the current identity.

use std::sync::Arc;

use keystone_domain::{Identity, IdentityPatch};
use tokio::sync::watch;
use tracing::debug;

/// Snapshot of the session: the current identity, if any.
///
/// Authentication is derived from the identity's presence, so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    user: Option<Arc<Identity>>,
}

impl SessionState {
    /// Returns the current identity.
    #[must_use]
    pub fn user(&self) -> Option<&Arc<Identity>> {
        self.user.as_ref()
    }

    /// Returns whether an identity is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Injectable session store with a single mutation entry point.
///
/// Clones share the same state. Every mutation goes through one `watch` sender, so
/// observers read the new state as soon as a mutation returns.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates an unauthenticated store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(SessionState::default())),
        }
    }

    /// Replaces the current identity wholesale.
    pub fn login(&self, identity: Identity) -> Arc<Identity> {
        let identity = Arc::new(identity);
        debug!(user_id = %identity.id, "session login");
        self.state.send_replace(SessionState {
            user: Some(Arc::clone(&identity)),
        });
        identity
    }

    /// Merges a partial identity into the current one.
    ///
    /// Without a session this is a silent no-op. Returns the resulting state.
    pub fn patch_user(&self, patch: &IdentityPatch) -> SessionState {
        self.state.send_if_modified(|state| {
            let Some(user) = state.user.as_ref() else {
                return false;
            };
            if patch.is_empty() {
                return false;
            }

            state.user = Some(Arc::new(user.merged(patch)));
            true
        });

        self.snapshot()
    }

    /// Clears the current identity. Idempotent.
    pub fn logout(&self) {
        let cleared = self.state.send_if_modified(|state| state.user.take().is_some());
        if cleared {
            debug!("session logout");
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns the current identity.
    #[must_use]
    pub fn current_user(&self) -> Option<Arc<Identity>> {
        self.state.borrow().user.clone()
    }

    /// Returns whether an identity is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}
