//! Permission and role membership derived from the current identity.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use keystone_domain::{ConsolePermission, Identity, Role};
use tokio::sync::watch;

use crate::{SessionState, SessionStore};

static NO_PERMISSIONS: BTreeSet<String> = BTreeSet::new();

/// Capabilities held by one identity, or none when unauthenticated.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    identity: Option<Arc<Identity>>,
    role_names: HashSet<String>,
}

impl CapabilitySet {
    /// Derives the capability set of an identity.
    #[must_use]
    pub fn from_identity(identity: Option<Arc<Identity>>) -> Self {
        let role_names = identity
            .as_deref()
            .map(|identity| identity.roles.iter().map(|role| role.name.clone()).collect())
            .unwrap_or_default();

        Self {
            identity,
            role_names,
        }
    }

    /// Derives the capability set of a session snapshot.
    #[must_use]
    pub fn from_session(state: &SessionState) -> Self {
        Self::from_identity(state.user().cloned())
    }

    /// Returns whether the set was derived from an identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Returns the identity the set was derived from.
    #[must_use]
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        self.identity.as_ref()
    }

    /// Returns the effective permission codes.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        self.identity
            .as_deref()
            .map_or(&NO_PERMISSIONS, |identity| &identity.permissions)
    }

    /// Returns the assigned roles.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        self.identity
            .as_deref()
            .map_or(&[] as &[Role], |identity| identity.roles.as_slice())
    }

    /// Returns whether the permission code is held. Never fails.
    #[must_use]
    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions().contains(code)
    }

    /// Returns whether a console permission is held.
    #[must_use]
    pub fn has_console_permission(&self, permission: ConsolePermission) -> bool {
        self.has_permission(permission.as_str())
    }

    /// Returns whether a role with that name is assigned.
    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.role_names.contains(name)
    }

    /// Returns whether at least one of the codes is held.
    #[must_use]
    pub fn has_any_permission<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes
            .into_iter()
            .any(|code| self.has_permission(code.as_ref()))
    }

    fn is_derived_from(&self, identity: Option<&Arc<Identity>>) -> bool {
        match (self.identity.as_ref(), identity) {
            (Some(current), Some(candidate)) => Arc::ptr_eq(current, candidate),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Keeps a capability set in step with a session store.
///
/// The set is rebuilt only when the identity reference changes.
#[derive(Debug)]
pub struct CapabilityTracker {
    receiver: watch::Receiver<SessionState>,
    current: Arc<CapabilitySet>,
}

impl CapabilityTracker {
    /// Starts tracking the store.
    #[must_use]
    pub fn new(session: &SessionStore) -> Self {
        let receiver = session.subscribe();
        let current = Arc::new(CapabilitySet::from_session(&receiver.borrow()));

        Self { receiver, current }
    }

    /// Returns the capability set for the current identity.
    pub fn current(&mut self) -> Arc<CapabilitySet> {
        let state = self.receiver.borrow_and_update();
        if !self.current.is_derived_from(state.user()) {
            self.current = Arc::new(CapabilitySet::from_session(&state));
        }

        Arc::clone(&self.current)
    }

    /// Waits for the next session change and returns the updated set.
    ///
    /// Returns `None` once every store handle has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<CapabilitySet>> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }
}
