//! Gate evaluated before entering a protected view.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use keystone_domain::Identity;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{IdentitySource, SessionStore};

/// Progress of the most recent guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// No check has run yet.
    Unchecked,
    /// The identity fetch is in flight.
    Checking,
    /// The caller may enter the view.
    Authorized,
    /// No valid session; redirected to login.
    Unauthenticated,
    /// Authenticated but missing the required permission.
    Forbidden,
}

/// Redirect produced instead of entering a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Redirect {
    /// Send the caller to login, then back to `redirect`.
    Login {
        /// Login destination path.
        to: String,
        /// Location to return to after login.
        redirect: String,
    },
    /// Tell the caller which permission is missing.
    Forbidden {
        /// Forbidden destination path.
        to: String,
        /// Missing permission code.
        missing: String,
        /// Location the caller came from.
        from: String,
    },
}

impl Redirect {
    /// Returns the destination path.
    #[must_use]
    pub fn to(&self) -> &str {
        match self {
            Self::Login { to, .. } | Self::Forbidden { to, .. } => to.as_str(),
        }
    }

    /// Returns the search parameters carried to the destination.
    #[must_use]
    pub fn search(&self) -> BTreeMap<&'static str, &str> {
        match self {
            Self::Login { redirect, .. } => BTreeMap::from([("redirect", redirect.as_str())]),
            Self::Forbidden { missing, from, .. } => {
                BTreeMap::from([("missing", missing.as_str()), ("from", from.as_str())])
            }
        }
    }

    /// Returns the destination with its search parameters URL-encoded.
    #[must_use]
    pub fn href(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.search())
            .finish();

        format!("{}?{query}", self.to())
    }
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Enter the view as this identity.
    Proceed(Arc<Identity>),
    /// Do not enter the view.
    Redirect(Redirect),
}

impl GuardOutcome {
    /// Returns the identity when the caller may proceed.
    #[must_use]
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        match self {
            Self::Proceed(identity) => Some(identity),
            Self::Redirect(_) => None,
        }
    }

    /// Returns the redirect, if any.
    #[must_use]
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Proceed(_) => None,
            Self::Redirect(redirect) => Some(redirect),
        }
    }
}

/// Handling of identity fetches that resolve after a newer check started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaleFetchPolicy {
    /// Every successful fetch logs in, the last one to resolve wins.
    #[default]
    LastWriteWins,
    /// Results of superseded checks never touch the session or guard state.
    DiscardSuperseded,
}

/// Guard destinations and policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Path of the login view.
    pub login_path: String,
    /// Path of the forbidden view.
    pub forbidden_path: String,
    /// Clear an existing session when the identity re-check fails.
    pub clear_stale_session: bool,
    /// Handling of late identity fetches.
    pub stale_fetch_policy: StaleFetchPolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_owned(),
            forbidden_path: "/forbidden".to_owned(),
            clear_stale_session: false,
            stale_fetch_policy: StaleFetchPolicy::LastWriteWins,
        }
    }
}

/// Navigation guard backed by the current-identity endpoint.
///
/// Authentication is always checked before authorization.
#[derive(Clone)]
pub struct NavigationGuard {
    session: SessionStore,
    identity_source: Arc<dyn IdentitySource>,
    config: GuardConfig,
    state: Arc<watch::Sender<GuardState>>,
    latest_check: Arc<AtomicU64>,
}

impl NavigationGuard {
    /// Creates a guard with default destinations.
    #[must_use]
    pub fn new(session: SessionStore, identity_source: Arc<dyn IdentitySource>) -> Self {
        Self::with_config(session, identity_source, GuardConfig::default())
    }

    /// Creates a guard with explicit destinations and policies.
    #[must_use]
    pub fn with_config(
        session: SessionStore,
        identity_source: Arc<dyn IdentitySource>,
        config: GuardConfig,
    ) -> Self {
        Self {
            session,
            identity_source,
            config,
            state: Arc::new(watch::Sender::new(GuardState::Unchecked)),
            latest_check: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the state reached by the most recent check.
    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    /// Subscribes to guard state transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Requires a valid session before entering `location`.
    pub async fn require_auth(&self, location: &str) -> GuardOutcome {
        let check = self.begin_check();
        match self.authenticate(check, location).await {
            Ok(identity) => {
                self.finish_check(check, GuardState::Authorized);
                GuardOutcome::Proceed(identity)
            }
            Err(redirect) => GuardOutcome::Redirect(redirect),
        }
    }

    /// Requires a valid session holding `code` before entering `location`.
    pub async fn require_permission(&self, code: &str, location: &str) -> GuardOutcome {
        let check = self.begin_check();
        let identity = match self.authenticate(check, location).await {
            Ok(identity) => identity,
            Err(redirect) => return GuardOutcome::Redirect(redirect),
        };

        if identity.permissions.contains(code) {
            self.finish_check(check, GuardState::Authorized);
            return GuardOutcome::Proceed(identity);
        }

        info!(
            user_id = %identity.id,
            permission = code,
            location,
            "missing permission; redirecting to forbidden view"
        );
        self.finish_check(check, GuardState::Forbidden);
        GuardOutcome::Redirect(Redirect::Forbidden {
            to: self.config.forbidden_path.clone(),
            missing: code.to_owned(),
            from: location.to_owned(),
        })
    }

    async fn authenticate(&self, check: u64, location: &str) -> Result<Arc<Identity>, Redirect> {
        match self.identity_source.fetch_current_identity().await {
            Ok(identity) => {
                if self.is_superseded(check) {
                    debug!(check, "discarding identity from superseded check");
                    return Ok(Arc::new(identity));
                }

                Ok(self.session.login(identity))
            }
            Err(error) => {
                info!(%error, location, "identity check failed; redirecting to login");
                if !self.is_superseded(check) {
                    if self.config.clear_stale_session {
                        self.session.logout();
                    }
                    self.finish_check(check, GuardState::Unauthenticated);
                }

                Err(Redirect::Login {
                    to: self.config.login_path.clone(),
                    redirect: location.to_owned(),
                })
            }
        }
    }

    fn begin_check(&self) -> u64 {
        let check = self.latest_check.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(GuardState::Checking);
        debug!(check, "guard check started");
        check
    }

    fn finish_check(&self, check: u64, state: GuardState) {
        if self.is_superseded(check) {
            return;
        }

        debug!(check, ?state, "guard check finished");
        self.state.send_replace(state);
    }

    fn is_superseded(&self, check: u64) -> bool {
        self.config.stale_fetch_policy == StaleFetchPolicy::DiscardSuperseded
            && self.latest_check.load(Ordering::SeqCst) != check
    }
}
