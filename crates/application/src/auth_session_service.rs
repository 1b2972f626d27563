//! Sign-in, sign-out and startup session restore.

use std::sync::Arc;

use keystone_core::AppResult;
use keystone_domain::{Identity, LoginCredentials};
use tracing::{debug, info, warn};

use crate::{AuthGateway, IdentitySource, SessionStore};

/// Destination used when a login carries no return path.
pub const DEFAULT_POST_LOGIN_PATH: &str = "/";

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    /// Identity now held by the session store.
    pub identity: Arc<Identity>,
    /// Where the caller should navigate next.
    pub destination: String,
}

/// Application service wrapping the login and logout endpoints around the session store.
#[derive(Clone)]
pub struct AuthSessionService {
    auth_gateway: Arc<dyn AuthGateway>,
    identity_source: Arc<dyn IdentitySource>,
    session: SessionStore,
}

impl AuthSessionService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        auth_gateway: Arc<dyn AuthGateway>,
        identity_source: Arc<dyn IdentitySource>,
        session: SessionStore,
    ) -> Self {
        Self {
            auth_gateway,
            identity_source,
            session,
        }
    }

    /// Restores an existing server session at startup.
    ///
    /// Failures leave the store as it was.
    pub async fn restore_session(&self) -> Option<Arc<Identity>> {
        match self.identity_source.fetch_current_identity().await {
            Ok(identity) => Some(self.session.login(identity)),
            Err(error) => {
                debug!(%error, "no session to restore");
                None
            }
        }
    }

    /// Signs in and resolves the post-login destination from the `redirect` parameter.
    pub async fn sign_in(
        &self,
        credentials: &LoginCredentials,
        redirect: Option<&str>,
    ) -> AppResult<SignedIn> {
        self.auth_gateway.login(credentials).await?;
        let identity = self
            .session
            .login(self.identity_source.fetch_current_identity().await?);

        let destination = redirect
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_POST_LOGIN_PATH)
            .to_owned();
        info!(user_id = %identity.id, %destination, "signed in");

        Ok(SignedIn {
            identity,
            destination,
        })
    }

    /// Signs out. The local session is cleared even when the logout call fails.
    pub async fn sign_out(&self) -> AppResult<()> {
        let result = self.auth_gateway.logout().await;
        self.session.logout();

        if let Err(error) = &result {
            warn!(%error, "logout call failed; local session cleared anyway");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use keystone_core::{AppError, AppResult};
    use keystone_domain::LoginCredentials;

    use super::AuthSessionService;
    use crate::test_support::{FakeIdentitySource, identity};
    use crate::{AuthGateway, SessionStore};

    #[derive(Default)]
    struct FakeAuthGateway {
        reject_login: bool,
        fail_logout: bool,
        logins: AtomicUsize,
        logouts: AtomicUsize,
    }

    #[async_trait]
    impl AuthGateway for FakeAuthGateway {
        async fn login(&self, _credentials: &LoginCredentials) -> AppResult<()> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            if self.reject_login {
                return Err(AppError::Unauthorized("invalid credentials".to_owned()));
            }
            Ok(())
        }

        async fn logout(&self) -> AppResult<()> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            if self.fail_logout {
                return Err(AppError::Transport("connection reset".to_owned()));
            }
            Ok(())
        }
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials::new("a@example.com", "correct horse")
            .unwrap_or_else(|_| panic!("credentials should validate"))
    }

    fn service(
        gateway: FakeAuthGateway,
        source: FakeIdentitySource,
    ) -> (AuthSessionService, SessionStore, Arc<FakeAuthGateway>) {
        let session = SessionStore::new();
        let gateway = Arc::new(gateway);
        let service = AuthSessionService::new(gateway.clone(), Arc::new(source), session.clone());
        (service, session, gateway)
    }

    #[tokio::test]
    async fn sign_in_logs_in_and_returns_redirect_target() {
        let (service, session, _) = service(
            FakeAuthGateway::default(),
            FakeIdentitySource::returning(Ok(identity(&["rbac:read"]))),
        );

        let result = service.sign_in(&credentials(), Some("/admin/rbac")).await;

        let Ok(signed_in) = result else {
            panic!("sign in should succeed");
        };
        assert_eq!(signed_in.destination, "/admin/rbac");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn sign_in_defaults_to_root_destination() {
        let (service, _, _) = service(
            FakeAuthGateway::default(),
            FakeIdentitySource::returning(Ok(identity(&[]))),
        );

        let result = service.sign_in(&credentials(), Some("  ")).await;

        assert_eq!(
            result.map(|signed_in| signed_in.destination).ok(),
            Some("/".to_owned())
        );
    }

    #[tokio::test]
    async fn rejected_sign_in_leaves_store_untouched() {
        let (service, session, _) = service(
            FakeAuthGateway {
                reject_login: true,
                ..FakeAuthGateway::default()
            },
            FakeIdentitySource::returning(Ok(identity(&[]))),
        );

        let result = service.sign_in(&credentials(), None).await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn sign_out_clears_session_even_when_call_fails() {
        let (service, session, gateway) = service(
            FakeAuthGateway {
                fail_logout: true,
                ..FakeAuthGateway::default()
            },
            FakeIdentitySource::default(),
        );
        session.login(identity(&[]));

        let result = service.sign_out().await;

        assert!(result.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(gateway.logouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn restore_session_keeps_store_empty_on_failure() {
        let (service, session, _) =
            service(FakeAuthGateway::default(), FakeIdentitySource::default());

        assert!(service.restore_session().await.is_none());
        assert!(!session.is_authenticated());
    }
}
